//! The rental lifecycle.
//!
//! A rental is booked `reserved`, handed over `rented`, and closed
//! `returned`. Every change is pushed onto the paired car through
//! [`CarStatusSync`], inside the same transaction as the rental write.
//!
//! Unknown rental ids on status change, edit and delete are silent no-ops
//! unless [`RentalConfig::strict_not_found`] is set.

use chrono::Utc;
use tracing::{info, warn};

use crate::cars::CarStatusSync;
use crate::config::RentalConfig;
use crate::error::{Error, Result};
use crate::hook::{MutationHook, SavedRecord};
use crate::models::{
    CarStatus, Collection, RecordId, Rental, RentalDetails, RentalFields, RentalRequest,
    RentalStatus,
};
use crate::storage::Storage;

/// Creates, advances, edits and deletes rentals.
#[derive(Debug, Clone, Copy)]
pub struct RentalManager<'a> {
    storage: &'a Storage,
    options: RentalConfig,
    hook: &'a dyn MutationHook,
}

impl<'a> RentalManager<'a> {
    /// Create a manager over the given store.
    #[must_use]
    pub fn new(storage: &'a Storage, options: RentalConfig, hook: &'a dyn MutationHook) -> Self {
        Self {
            storage,
            options,
            hook,
        }
    }

    /// Book a rental. It starts `reserved` and its car becomes reserved.
    ///
    /// The car is not checked for availability unless
    /// `require_available_car` is set.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing or malformed field (nothing
    /// is written), or for an unavailable car when availability is required.
    pub fn create_rental(&self, request: &RentalRequest) -> Result<Rental> {
        let fields = request.validate()?;

        let rental = self.storage.atomically(|storage| {
            if self.options.require_available_car {
                check_available(storage, fields.car_id)?;
            }
            let id = storage.insert_rental(&fields, RentalStatus::Reserved, Utc::now())?;
            CarStatusSync::new(storage).apply_rental_status(fields.car_id, RentalStatus::Reserved)?;
            reload(storage, id)
        })?;

        info!(
            "Created rental {} for car {} ({} to {})",
            rental.id, rental.car_id, rental.start_date, rental.return_date
        );
        self.hook.saved(SavedRecord::Rental(&rental));
        Ok(rental)
    }

    /// Move a rental to `status` and its car along with it.
    ///
    /// Any target is accepted, including going backwards. Applying the same
    /// status twice leaves the same state as applying it once.
    ///
    /// Returns `None` when the rental does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown rental when
    /// `strict_not_found` is set, or a database error.
    pub fn update_rental_status(
        &self,
        id: RecordId,
        status: RentalStatus,
    ) -> Result<Option<Rental>> {
        let updated = self.storage.atomically(|storage| {
            let Some(rental) = storage.get_rental(id)? else {
                return Ok(None);
            };
            storage.set_rental_status(id, status)?;
            CarStatusSync::new(storage).apply_rental_status(rental.car_id, status)?;
            reload(storage, id).map(Some)
        })?;

        match updated {
            Some(rental) => {
                info!("Rental {} is now {}", id, status);
                self.hook.saved(SavedRecord::Rental(&rental));
                Ok(Some(rental))
            }
            None => self.missing(id, "status change").map(|()| None),
        }
    }

    /// Replace a rental's car, client, dates and price.
    ///
    /// Neither the rental status nor any car status changes, even when the
    /// rental moves to another car.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad field, [`Error::NotFound`] for
    /// an unknown rental when `strict_not_found` is set, or a database error.
    pub fn update_rental_details(
        &self,
        id: RecordId,
        request: &RentalRequest,
    ) -> Result<Option<Rental>> {
        let fields: RentalFields = request.validate()?;

        if !self.storage.update_rental(id, &fields)? {
            return self.missing(id, "edit").map(|()| None);
        }

        let rental = reload(self.storage, id)?;
        info!("Updated rental {}", id);
        self.hook.saved(SavedRecord::Rental(&rental));
        Ok(Some(rental))
    }

    /// Delete a rental. A rental that was not returned frees its car first.
    ///
    /// Returns `true` if a rental was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown rental when
    /// `strict_not_found` is set, or a database error.
    pub fn delete_rental(&self, id: RecordId) -> Result<bool> {
        let deleted = self.storage.atomically(|storage| {
            if let Some(rental) = storage.get_rental(id)? {
                if rental.status.is_active() {
                    CarStatusSync::new(storage).release(rental.car_id)?;
                }
            }
            storage.delete(Collection::Rentals, id)
        })?;

        if deleted {
            info!("Deleted rental {}", id);
        } else {
            self.missing(id, "delete")?;
        }
        Ok(deleted)
    }

    /// Get a rental.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such rental.
    pub fn get_rental(&self, id: RecordId) -> Result<Rental> {
        self.storage
            .get_rental(id)?
            .ok_or_else(|| Error::not_found(Collection::Rentals, id))
    }

    /// Every rental with its car and client, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_rentals(&self) -> Result<Vec<RentalDetails>> {
        self.storage.list_rental_details()
    }

    fn missing(&self, id: RecordId, action: &str) -> Result<()> {
        if self.options.strict_not_found {
            return Err(Error::not_found(Collection::Rentals, id));
        }
        warn!("Rental {} not found; {} ignored", id, action);
        Ok(())
    }
}

fn check_available(storage: &Storage, car_id: RecordId) -> Result<()> {
    match storage.get_car(car_id)? {
        Some(car) if car.status == CarStatus::Available => Ok(()),
        Some(car) => Err(Error::validation(
            "car_id",
            format!("car {car_id} is {}", car.status),
        )),
        None => Err(Error::validation(
            "car_id",
            format!("car {car_id} does not exist"),
        )),
    }
}

fn reload(storage: &Storage, id: RecordId) -> Result<Rental> {
    storage
        .get_rental(id)?
        .ok_or_else(|| Error::internal(format!("rental {id} vanished after write")))
}
