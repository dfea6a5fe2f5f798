//! Client records and their identity document scans.

use chrono::Utc;
use tracing::info;

use crate::error::{Error, Result};
use crate::hook::{MutationHook, SavedRecord};
use crate::models::{non_blank, require, Client, Collection, NewClient, RecordId};
use crate::storage::Storage;

/// Client registration and editing.
#[derive(Debug, Clone, Copy)]
pub struct ClientBook<'a> {
    storage: &'a Storage,
    hook: &'a dyn MutationHook,
}

impl<'a> ClientBook<'a> {
    /// Create a client book over the given store.
    #[must_use]
    pub fn new(storage: &'a Storage, hook: &'a dyn MutationHook) -> Self {
        Self { storage, hook }
    }

    /// Register a client. Blank optional fields are stored as absent.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the full name is blank.
    pub fn add_client(&self, client: &NewClient) -> Result<Client> {
        let normalized = NewClient {
            full_name: require("full_name", &client.full_name)?.to_string(),
            passport_id: non_blank(client.passport_id.as_deref()),
            driving_license: non_blank(client.driving_license.as_deref()),
            passport_image: non_blank(client.passport_image.as_deref()),
            license_image: non_blank(client.license_image.as_deref()),
        };

        let id = self.storage.insert_client(&normalized, Utc::now())?;
        info!("Registered client {}", id);
        self.saved(id)
    }

    /// Get a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such client.
    pub fn get_client(&self, id: RecordId) -> Result<Client> {
        self.storage
            .get_client(id)?
            .ok_or_else(|| Error::not_found(Collection::Clients, id))
    }

    /// Every client, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_clients(&self) -> Result<Vec<Client>> {
        self.storage.list_clients()
    }

    /// Replace a client's name and document numbers. Scans are kept.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or
    /// [`Error::NotFound`] if there is no such client. An unknown client is
    /// never ignored the way an unknown rental can be.
    pub fn update_client(
        &self,
        id: RecordId,
        full_name: &str,
        passport_id: Option<&str>,
        driving_license: Option<&str>,
    ) -> Result<Client> {
        let full_name = require("full_name", full_name)?;
        let passport_id = non_blank(passport_id);
        let driving_license = non_blank(driving_license);

        if !self.storage.update_client(
            id,
            full_name,
            passport_id.as_deref(),
            driving_license.as_deref(),
        )? {
            return Err(Error::not_found(Collection::Clients, id));
        }
        info!("Updated client {}", id);
        self.saved(id)
    }

    /// Attach document scan references. A `None` keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such client.
    pub fn attach_documents(
        &self,
        id: RecordId,
        passport_image: Option<&str>,
        license_image: Option<&str>,
    ) -> Result<Client> {
        let current = self.get_client(id)?;
        let passport_image = non_blank(passport_image).or(current.passport_image);
        let license_image = non_blank(license_image).or(current.license_image);

        self.storage
            .set_client_documents(id, passport_image.as_deref(), license_image.as_deref())?;
        info!("Attached documents to client {}", id);
        self.saved(id)
    }

    /// Drop both document scan references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such client.
    pub fn clear_documents(&self, id: RecordId) -> Result<Client> {
        if !self.storage.set_client_documents(id, None, None)? {
            return Err(Error::not_found(Collection::Clients, id));
        }
        info!("Cleared documents of client {}", id);
        self.saved(id)
    }

    /// Delete a client. Their rentals stay but drop out of rental listings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such client. Unlike an
    /// unknown rental id, which is ignored unless `rentals.strict_not_found`
    /// is set, this is always reported, and the CLI exits with code 2.
    pub fn delete_client(&self, id: RecordId) -> Result<()> {
        if !self.storage.delete(Collection::Clients, id)? {
            return Err(Error::not_found(Collection::Clients, id));
        }
        info!("Deleted client {}", id);
        Ok(())
    }

    fn saved(&self, id: RecordId) -> Result<Client> {
        let client = self.get_client(id)?;
        self.hook.saved(SavedRecord::Client(&client));
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::NoopHook;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn new_client() -> NewClient {
        NewClient {
            full_name: " Leila Haddad ".to_string(),
            passport_id: Some("AB123456".to_string()),
            driving_license: Some("  ".to_string()),
            passport_image: None,
            license_image: None,
        }
    }

    #[test]
    fn test_add_client_normalizes_fields() {
        let storage = create_test_storage();
        let client = ClientBook::new(&storage, &NoopHook)
            .add_client(&new_client())
            .unwrap();

        assert_eq!(client.full_name, "Leila Haddad");
        assert_eq!(client.passport_id.as_deref(), Some("AB123456"));
        assert_eq!(client.driving_license, None);
    }

    #[test]
    fn test_add_client_requires_name() {
        let storage = create_test_storage();
        let err = ClientBook::new(&storage, &NoopHook)
            .add_client(&NewClient::default())
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("full_name"));
    }

    #[test]
    fn test_update_client_keeps_documents() {
        let storage = create_test_storage();
        let book = ClientBook::new(&storage, &NoopHook);
        let client = book.add_client(&new_client()).unwrap();
        book.attach_documents(client.id, Some("passport.jpg"), None)
            .unwrap();

        let updated = book
            .update_client(client.id, "Leila H.", None, Some("DL-77"))
            .unwrap();
        assert_eq!(updated.full_name, "Leila H.");
        assert_eq!(updated.passport_id, None);
        assert_eq!(updated.driving_license.as_deref(), Some("DL-77"));
        assert_eq!(updated.passport_image.as_deref(), Some("passport.jpg"));
    }

    #[test]
    fn test_attach_and_clear_documents() {
        let storage = create_test_storage();
        let book = ClientBook::new(&storage, &NoopHook);
        let client = book.add_client(&new_client()).unwrap();

        book.attach_documents(client.id, Some("p.jpg"), None).unwrap();
        let both = book
            .attach_documents(client.id, None, Some("l.png"))
            .unwrap();
        assert_eq!(both.passport_image.as_deref(), Some("p.jpg"));
        assert_eq!(both.license_image.as_deref(), Some("l.png"));

        let cleared = book.clear_documents(client.id).unwrap();
        assert_eq!(cleared.passport_image, None);
        assert_eq!(cleared.license_image, None);
    }

    #[test]
    fn test_unknown_client() {
        let storage = create_test_storage();
        let book = ClientBook::new(&storage, &NoopHook);

        assert!(book.get_client(3).unwrap_err().is_not_found());
        assert!(book
            .update_client(3, "Name", None, None)
            .unwrap_err()
            .is_not_found());
        assert!(book.attach_documents(3, Some("x"), None).unwrap_err().is_not_found());
        assert!(book.clear_documents(3).unwrap_err().is_not_found());
        let err = book.delete_client(3).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.is_client_fault());
    }

    #[test]
    fn test_list_and_delete() {
        let storage = create_test_storage();
        let book = ClientBook::new(&storage, &NoopHook);
        let first = book.add_client(&new_client()).unwrap();
        book.add_client(&new_client()).unwrap();

        assert_eq!(book.list_clients().unwrap().len(), 2);
        book.delete_client(first.id).unwrap();
        assert_eq!(book.list_clients().unwrap().len(), 1);
    }
}
