//! Error types for fleetdesk.
//!
//! This module defines all error types used throughout the fleetdesk crate,
//! split into caller faults (bad input, unknown records) and server faults
//! (the store or the environment failed).

use std::path::PathBuf;
use thiserror::Error;

use crate::models::Collection;

/// The main error type for fleetdesk operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Caller Errors ===
    /// A required field is missing or malformed. Raised before any store call.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{collection} record {id} not found")]
    NotFound {
        /// Collection that was searched.
        collection: Collection,
        /// The identifier that was looked up.
        id: i64,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for fleetdesk operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for the named field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a not-found error for a record in the given collection.
    #[must_use]
    pub fn not_found(collection: Collection, id: i64) -> Self {
        Self::NotFound { collection, id }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error reports a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error reports rejected input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if the caller is at fault (bad input or unknown record).
    ///
    /// Everything else is a server fault: the store, the file system or the
    /// configuration failed underneath a well-formed request.
    #[must_use]
    pub fn is_client_fault(&self) -> bool {
        self.is_validation() || self.is_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("start_date", "is required");
        assert_eq!(err.to_string(), "invalid start_date: is required");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = Error::not_found(Collection::Rentals, 42);
        assert_eq!(err.to_string(), "rentals record 42 not found");
    }

    #[test]
    fn test_error_predicates() {
        assert!(Error::validation("model", "missing").is_validation());
        assert!(!Error::validation("model", "missing").is_not_found());
        assert!(Error::not_found(Collection::Cars, 1).is_not_found());
        assert!(!Error::internal("boom").is_validation());
    }

    #[test]
    fn test_client_fault_classification() {
        assert!(Error::validation("price", "negative").is_client_fault());
        assert!(Error::not_found(Collection::Clients, 3).is_client_fault());
        assert!(!Error::internal("bug").is_client_fault());
        assert!(!Error::DatabaseMigration {
            message: "bad".to_string()
        }
        .is_client_fault());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "utc_offset_hours out of range".to_string(),
        };
        assert!(err.to_string().contains("utc_offset_hours"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
