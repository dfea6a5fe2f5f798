//! Post-mutation hooks.
//!
//! After a rental or client is saved, the full record is handed to a
//! [`MutationHook`]. This is the seam for an external backup exporter; the
//! crate itself only ships a no-op hook and one that logs the snapshot.

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Client, Collection, RecordId, Rental};

/// A record that was just written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SavedRecord<'a> {
    /// A rental, after create, status change or edit.
    Rental(&'a Rental),
    /// A client, after registration, edit or document change.
    Client(&'a Client),
}

impl SavedRecord<'_> {
    /// Collection the record belongs to.
    #[must_use]
    pub fn collection(&self) -> Collection {
        match self {
            Self::Rental(_) => Collection::Rentals,
            Self::Client(_) => Collection::Clients,
        }
    }

    /// Identity of the record.
    #[must_use]
    pub fn id(&self) -> RecordId {
        match self {
            Self::Rental(rental) => rental.id,
            Self::Client(client) => client.id,
        }
    }
}

/// Receives every saved record.
///
/// Hooks run after the write has been committed and cannot fail the
/// operation; implementations log their own errors.
pub trait MutationHook: Send + Sync + std::fmt::Debug {
    /// Called once per saved record.
    fn saved(&self, record: SavedRecord<'_>);
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl MutationHook for NoopHook {
    fn saved(&self, _record: SavedRecord<'_>) {}
}

/// Hook that emits each snapshot as JSON in a debug event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl MutationHook for TracingHook {
    fn saved(&self, record: SavedRecord<'_>) {
        match serde_json::to_string(&record) {
            Ok(snapshot) => debug!(
                collection = %record.collection(),
                id = record.id(),
                %snapshot,
                "record saved"
            ),
            Err(e) => warn!(
                "Failed to serialize {} record {}: {}",
                record.collection(),
                record.id(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RentalStatus;
    use chrono::Utc;

    fn rental() -> Rental {
        Rental {
            id: 5,
            car_id: 1,
            client_id: 2,
            start_date: "2024-06-10".to_string(),
            return_date: "2024-06-11".to_string(),
            rental_price: 80.0,
            status: RentalStatus::Reserved,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_saved_record_identity() {
        let rental = rental();
        let record = SavedRecord::Rental(&rental);
        assert_eq!(record.collection(), Collection::Rentals);
        assert_eq!(record.id(), 5);
    }

    #[test]
    fn test_snapshot_is_the_full_record() {
        let rental = rental();
        let json = serde_json::to_value(SavedRecord::Rental(&rental)).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["status"], "reserved");
        assert_eq!(json["rental_price"], 80.0);
    }

    #[test]
    fn test_builtin_hooks_do_not_panic() {
        crate::logging::init_test_logging();
        let rental = rental();
        NoopHook.saved(SavedRecord::Rental(&rental));
        TracingHook.saved(SavedRecord::Rental(&rental));
    }
}
