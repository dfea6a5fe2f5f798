//! The [`Fleet`] handle.
//!
//! A fleet owns the store, the configuration and the mutation hook, and
//! hands out the short-lived components that operate on them.

use chrono::NaiveDate;

use crate::cars::{CarRegistry, CarStatusSync};
use crate::clients::ClientBook;
use crate::config::Config;
use crate::error::Result;
use crate::expenses::ExpenseLedger;
use crate::finance::FinancialAggregator;
use crate::hook::{MutationHook, NoopHook, TracingHook};
use crate::notifications::NotificationDeriver;
use crate::rentals::RentalManager;
use crate::storage::Storage;

/// An open fleet database with its settings.
#[derive(Debug)]
pub struct Fleet {
    storage: Storage,
    config: Config,
    hook: Box<dyn MutationHook>,
}

impl Fleet {
    /// Wrap an open store.
    ///
    /// The snapshot-logging hook is installed when `backup.log_snapshots`
    /// is set; otherwise saved records go nowhere.
    #[must_use]
    pub fn new(storage: Storage, config: Config) -> Self {
        let hook: Box<dyn MutationHook> = if config.backup.log_snapshots {
            Box::new(TracingHook)
        } else {
            Box::new(NoopHook)
        };
        Self {
            storage,
            config,
            hook,
        }
    }

    /// Open the database named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        Ok(Self::new(storage, config))
    }

    /// Replace the mutation hook.
    #[must_use]
    pub fn with_hook(mut self, hook: impl MutationHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The agency's current day.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }

    /// Car records.
    #[must_use]
    pub fn cars(&self) -> CarRegistry<'_> {
        CarRegistry::new(&self.storage)
    }

    /// Car status writes and the car/rental view.
    #[must_use]
    pub fn car_status(&self) -> CarStatusSync<'_> {
        CarStatusSync::new(&self.storage)
    }

    /// The rental lifecycle.
    #[must_use]
    pub fn rentals(&self) -> RentalManager<'_> {
        RentalManager::new(&self.storage, self.config.rentals, self.hook.as_ref())
    }

    /// Client records.
    #[must_use]
    pub fn clients(&self) -> ClientBook<'_> {
        ClientBook::new(&self.storage, self.hook.as_ref())
    }

    /// Expense records.
    #[must_use]
    pub fn expenses(&self) -> ExpenseLedger<'_> {
        ExpenseLedger::new(&self.storage)
    }

    /// Notices, defaulting to [`Fleet::today`].
    #[must_use]
    pub fn notices(&self) -> NotificationDeriver<'_> {
        NotificationDeriver::new(&self.storage, self.today())
    }

    /// Money totals and the dashboard.
    #[must_use]
    pub fn finance(&self) -> FinancialAggregator<'_> {
        FinancialAggregator::new(&self.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CarStatus, RentalRequest};

    fn test_fleet(config: Config) -> Fleet {
        Fleet::new(Storage::open_in_memory().unwrap(), config)
    }

    #[test]
    fn test_components_share_the_store() {
        let fleet = test_fleet(Config::default());
        let car = fleet.cars().add_car("Toyota Yaris", "11-F-2").unwrap();
        let client = fleet
            .clients()
            .add_client(&crate::models::NewClient {
                full_name: "Hamza".to_string(),
                ..Default::default()
            })
            .unwrap();

        fleet
            .rentals()
            .create_rental(&RentalRequest {
                car_id: car.id.to_string(),
                client_id: client.id.to_string(),
                start_date: "2024-06-10".to_string(),
                return_date: "2024-06-11".to_string(),
                rental_price: None,
            })
            .unwrap();

        assert_eq!(
            fleet.cars().get_car(car.id).unwrap().status,
            CarStatus::Reserved
        );
        assert_eq!(fleet.car_status().cars_with_current_rental().unwrap().len(), 1);
        assert!(fleet.finance().total_revenue().unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_rental_options_come_from_config() {
        let mut config = Config::default();
        config.rentals.strict_not_found = true;
        let fleet = test_fleet(config);

        assert!(fleet.rentals().delete_rental(1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_with_hook_and_accessors() {
        let mut config = Config::default();
        config.backup.log_snapshots = true;
        let fleet = test_fleet(config).with_hook(NoopHook);

        assert!(fleet.config().backup.log_snapshots);
        assert_eq!(fleet.storage().path().to_string_lossy(), ":memory:");
        assert_eq!(fleet.today(), fleet.config().today());
    }
}
