//! Cars and their status.
//!
//! [`CarRegistry`] covers plain car records. [`CarStatusSync`] owns every
//! write to `cars.status`: the manual override and the side effects of the
//! rental lifecycle.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{
    require, Car, CarStats, CarStatus, CarWithCurrentRental, Collection, RecordId, RentalStatus,
};
use crate::storage::Storage;

/// Car record management.
#[derive(Debug, Clone, Copy)]
pub struct CarRegistry<'a> {
    storage: &'a Storage,
}

impl<'a> CarRegistry<'a> {
    /// Create a registry over the given store.
    #[must_use]
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Add a car to the fleet. New cars are available.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the model or plate is blank, or a
    /// database error.
    pub fn add_car(&self, model: &str, plate_number: &str) -> Result<Car> {
        let model = require("model", model)?;
        let plate_number = require("plate_number", plate_number)?;

        let id = self
            .storage
            .insert_car(model, plate_number, CarStatus::Available, Utc::now())?;
        info!("Added car {} ({} {})", id, model, plate_number);
        self.get_car(id)
    }

    /// Get a car.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such car.
    pub fn get_car(&self, id: RecordId) -> Result<Car> {
        self.storage
            .get_car(id)?
            .ok_or_else(|| Error::not_found(Collection::Cars, id))
    }

    /// Change a car's model and plate. The status is not touched.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, or
    /// [`Error::NotFound`] if there is no such car. An unknown car is never
    /// ignored the way an unknown rental can be.
    pub fn update_car(&self, id: RecordId, model: &str, plate_number: &str) -> Result<Car> {
        let model = require("model", model)?;
        let plate_number = require("plate_number", plate_number)?;

        if !self.storage.update_car(id, model, plate_number)? {
            return Err(Error::not_found(Collection::Cars, id));
        }
        info!("Updated car {}", id);
        self.get_car(id)
    }

    /// Delete a car.
    ///
    /// Rentals and expenses that reference it are left in place; rental
    /// listings stop showing them and expense listings show no car.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such car. Unlike an unknown
    /// rental id, which is ignored unless `rentals.strict_not_found` is set,
    /// this is always reported, and the CLI exits with code 2.
    pub fn delete_car(&self, id: RecordId) -> Result<()> {
        if !self.storage.delete(Collection::Cars, id)? {
            return Err(Error::not_found(Collection::Cars, id));
        }
        info!("Deleted car {}", id);
        Ok(())
    }

    /// Count cars per status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn car_stats(&self) -> Result<CarStats> {
        self.storage.car_stats()
    }
}

/// A car whose stored status disagrees with its current rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDrift {
    /// The car.
    pub car_id: RecordId,
    /// Its model.
    pub model: String,
    /// Its plate.
    pub plate_number: String,
    /// Status found in the store.
    pub stored: CarStatus,
    /// Status implied by the current rental, or available without one.
    pub expected: CarStatus,
    /// The rental the expectation comes from.
    pub rental_id: Option<RecordId>,
}

/// Writes car statuses and reads the car/rental join.
#[derive(Debug, Clone, Copy)]
pub struct CarStatusSync<'a> {
    storage: &'a Storage,
}

impl<'a> CarStatusSync<'a> {
    /// Create a synchronizer over the given store.
    #[must_use]
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Manual override: overwrite a car's status, whatever its rentals say.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such car.
    pub fn set_car_status(&self, car_id: RecordId, status: CarStatus) -> Result<()> {
        if !self.storage.set_car_status(car_id, status)? {
            return Err(Error::not_found(Collection::Cars, car_id));
        }
        info!("Car {} status set to {}", car_id, status);
        Ok(())
    }

    /// Push a rental's state onto its paired car.
    ///
    /// Returns `false` when the car no longer exists. That is not an error:
    /// cars can be deleted under their rentals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn apply_rental_status(&self, car_id: RecordId, rental: RentalStatus) -> Result<bool> {
        let status = rental.car_status();
        let updated = self.storage.set_car_status(car_id, status)?;
        if updated {
            debug!("Car {} follows rental status {} -> {}", car_id, rental, status);
        } else {
            warn!("Car {} is gone; rental status {} not applied", car_id, rental);
        }
        Ok(updated)
    }

    /// Make a car available again.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn release(&self, car_id: RecordId) -> Result<bool> {
        self.apply_rental_status(car_id, RentalStatus::Returned)
    }

    /// Every car, newest first, with the dates of its current rental.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn cars_with_current_rental(&self) -> Result<Vec<CarWithCurrentRental>> {
        self.storage.list_cars_with_current_rental()
    }

    /// List cars whose stored status is not the one their current rental
    /// implies. Nothing is repaired.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn status_drift(&self) -> Result<Vec<StatusDrift>> {
        let drift: Vec<StatusDrift> = self
            .cars_with_current_rental()?
            .into_iter()
            .filter_map(|entry| {
                let expected = entry
                    .current_rental
                    .as_ref()
                    .map_or(CarStatus::Available, |r| r.status.car_status());
                (entry.car.status != expected).then(|| StatusDrift {
                    car_id: entry.car.id,
                    model: entry.car.model,
                    plate_number: entry.car.plate_number,
                    stored: entry.car.status,
                    expected,
                    rental_id: entry.current_rental.map(|r| r.rental_id),
                })
            })
            .collect();

        for d in &drift {
            warn!(
                "Car {} is {} but its rentals say {}",
                d.car_id, d.stored, d.expected
            );
        }
        Ok(drift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewClient, RentalFields};

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn book(storage: &Storage, car_id: RecordId, status: RentalStatus) -> RecordId {
        let client = storage
            .insert_client(
                &NewClient {
                    full_name: "Nadia".to_string(),
                    ..NewClient::default()
                },
                Utc::now(),
            )
            .unwrap();
        let fields = RentalFields {
            car_id,
            client_id: client,
            start_date: "2024-06-10".to_string(),
            return_date: "2024-06-12".to_string(),
            rental_price: 90.0,
        };
        storage.insert_rental(&fields, status, Utc::now()).unwrap()
    }

    #[test]
    fn test_add_car_starts_available() {
        let storage = create_test_storage();
        let car = CarRegistry::new(&storage)
            .add_car(" Dacia Sandero ", "4521-B-6")
            .unwrap();

        assert_eq!(car.model, "Dacia Sandero");
        assert_eq!(car.status, CarStatus::Available);
    }

    #[test]
    fn test_add_car_requires_fields() {
        let storage = create_test_storage();
        let registry = CarRegistry::new(&storage);

        assert!(registry.add_car("", "1").unwrap_err().is_validation());
        assert!(registry.add_car("Clio", "  ").unwrap_err().is_validation());
        assert_eq!(storage.count(Collection::Cars).unwrap(), 0);
    }

    #[test]
    fn test_update_and_delete_car() {
        let storage = create_test_storage();
        let registry = CarRegistry::new(&storage);
        let car = registry.add_car("Clio", "1").unwrap();

        let updated = registry.update_car(car.id, "Clio V", "2").unwrap();
        assert_eq!(updated.plate_number, "2");

        registry.delete_car(car.id).unwrap();
        assert!(registry.get_car(car.id).unwrap_err().is_not_found());
        let err = registry.delete_car(car.id).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.is_client_fault());
    }

    #[test]
    fn test_set_car_status_unknown_car() {
        let storage = create_test_storage();
        let err = CarStatusSync::new(&storage)
            .set_car_status(404, CarStatus::Rented)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_apply_rental_status_maps_states() {
        let storage = create_test_storage();
        let car = CarRegistry::new(&storage).add_car("Golf", "7").unwrap();
        let sync = CarStatusSync::new(&storage);

        for (rental, expected) in [
            (RentalStatus::Reserved, CarStatus::Reserved),
            (RentalStatus::Rented, CarStatus::Rented),
            (RentalStatus::Returned, CarStatus::Available),
        ] {
            assert!(sync.apply_rental_status(car.id, rental).unwrap());
            assert_eq!(storage.get_car(car.id).unwrap().unwrap().status, expected);
        }
    }

    #[test]
    fn test_apply_rental_status_missing_car() {
        let storage = create_test_storage();
        assert!(!CarStatusSync::new(&storage).release(77).unwrap());
    }

    #[test]
    fn test_status_drift_reports_without_repairing() {
        let storage = create_test_storage();
        let registry = CarRegistry::new(&storage);
        let sync = CarStatusSync::new(&storage);

        let idle = registry.add_car("Idle", "1").unwrap();
        let stuck = registry.add_car("Stuck", "2").unwrap();
        let booked = registry.add_car("Booked", "3").unwrap();
        let consistent = registry.add_car("Consistent", "4").unwrap();

        sync.set_car_status(stuck.id, CarStatus::Rented).unwrap();
        let rental = book(&storage, booked.id, RentalStatus::Reserved);
        book(&storage, consistent.id, RentalStatus::Rented);
        sync.set_car_status(consistent.id, CarStatus::Rented).unwrap();

        let drift = sync.status_drift().unwrap();
        assert_eq!(drift.len(), 2);

        let stuck_drift = drift.iter().find(|d| d.car_id == stuck.id).unwrap();
        assert_eq!(stuck_drift.stored, CarStatus::Rented);
        assert_eq!(stuck_drift.expected, CarStatus::Available);
        assert_eq!(stuck_drift.rental_id, None);

        let booked_drift = drift.iter().find(|d| d.car_id == booked.id).unwrap();
        assert_eq!(booked_drift.expected, CarStatus::Reserved);
        assert_eq!(booked_drift.rental_id, Some(rental));

        assert!(drift.iter().all(|d| d.car_id != idle.id));
        assert_eq!(
            storage.get_car(stuck.id).unwrap().unwrap().status,
            CarStatus::Rented
        );
    }
}
