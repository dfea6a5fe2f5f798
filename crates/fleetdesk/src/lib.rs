//! `fleetdesk` - Bookkeeping for a small car rental agency
//!
//! This library keeps the agency's cars, clients, rentals and expenses in an
//! embedded database, keeps each car's status in step with its rentals, and
//! derives notices and money totals from the stored records.
//!
//! ```no_run
//! use fleetdesk::{Config, Fleet};
//!
//! # fn main() -> fleetdesk::Result<()> {
//! let fleet = Fleet::open(Config::load()?)?;
//! for notice in fleet.notices().notices()? {
//!     println!("{} {}", notice.kind, notice.rental.plate_number);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cars;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod expenses;
pub mod finance;
pub mod fleet;
pub mod hook;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod rentals;
pub mod storage;

pub use cars::{CarRegistry, CarStatusSync, StatusDrift};
pub use clients::ClientBook;
pub use config::Config;
pub use error::{Error, Result};
pub use expenses::ExpenseLedger;
pub use finance::{Dashboard, FinancialAggregator, ProfitReport};
pub use fleet::Fleet;
pub use hook::{MutationHook, NoopHook, SavedRecord, TracingHook};
pub use logging::init_logging;
pub use models::{
    Car, CarStats, CarStatus, CarWithCurrentRental, Client, Collection, Expense, ExpenseDetails,
    NewClient, NewExpense, RecordId, Rental, RentalDetails, RentalRequest, RentalStatus,
};
pub use notifications::{derive_notices, Notice, NoticeKind, NotificationDeriver, Severity};
pub use rentals::RentalManager;
pub use storage::{Storage, StorageStats};
