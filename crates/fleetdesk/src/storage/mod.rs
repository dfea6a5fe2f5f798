//! Storage layer for fleetdesk.
//!
//! This module provides `SQLite`-based persistent storage for the four fleet
//! collections. Each collection gets typed insert/get/list/update methods;
//! the joins between collections (car with its current rental, rental with
//! car and client names, expense with its car) and the grouped sums are plain
//! SQL queries returning the read models in [`crate::models`].

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{
    Car, CarStats, CarStatus, CarWithCurrentRental, Client, Collection, CurrentRental, Expense,
    ExpenseDetails, NewClient, NewExpense, RecordId, Rental, RentalDetails, RentalFields,
    RentalStatus,
};

const CAR_COLUMNS: &str = "c.id, c.model, c.plate_number, c.status, c.created_at";

const CLIENT_COLUMNS: &str =
    "id, full_name, passport_id, driving_license, passport_image, license_image, created_at";

const RENTAL_COLUMNS: &str =
    "r.id, r.car_id, r.client_id, r.start_date, r.return_date, r.rental_price, r.status, r.created_at";

const EXPENSE_COLUMNS: &str =
    "e.id, e.category, e.amount, e.expense_date, e.car_id, e.description, e.created_at";

/// Storage engine for fleet records.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Typed CRUD over cars, clients, rentals and expenses
/// - Cross-collection joins for listings
/// - Revenue and expense sums
/// - Grouping several writes into one transaction
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` inside one transaction.
    ///
    /// Everything `f` writes through `self` commits together, or not at all
    /// when `f` returns an error. Transactions do not nest.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or a database error if the transaction
    /// cannot be started or committed.
    pub fn atomically<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // === Cars ===

    /// Insert a car and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_car(
        &self,
        model: &str,
        plate_number: &str,
        status: CarStatus,
        created_at: DateTime<Utc>,
    ) -> Result<RecordId> {
        self.conn.execute(
            "INSERT INTO cars (model, plate_number, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                model,
                plate_number,
                status.to_string(),
                format_timestamp(created_at)
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted car with id {}", id);
        Ok(id)
    }

    /// Get a car by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_car(&self, id: RecordId) -> Result<Option<Car>> {
        let car = self
            .conn
            .query_row(
                &format!("SELECT {CAR_COLUMNS} FROM cars c WHERE c.id = ?1"),
                [id],
                Self::row_to_car,
            )
            .optional()?;
        Ok(car)
    }

    /// List all cars, newest first, each joined with its current rental.
    ///
    /// The current rental is the most recently created reserved or rented
    /// rental of the car; equal creation times fall back to the higher id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_cars_with_current_rental(&self) -> Result<Vec<CarWithCurrentRental>> {
        let mut stmt = self.conn.prepare(&format!(
            r"
            SELECT {CAR_COLUMNS}, r.id, r.status, r.start_date, r.return_date
            FROM cars c
            LEFT JOIN rentals r ON r.id = (
                SELECT a.id FROM rentals a
                WHERE a.car_id = c.id AND a.status IN ('reserved', 'rented')
                ORDER BY a.created_at DESC, a.id DESC
                LIMIT 1
            )
            ORDER BY c.created_at DESC, c.id DESC
            "
        ))?;

        let cars = stmt
            .query_map([], |row| {
                let car = Self::row_to_car(row)?;
                let rental_id: Option<RecordId> = row.get(5)?;
                let current_rental = match rental_id {
                    Some(rental_id) => Some(CurrentRental {
                        rental_id,
                        status: parse_rental_status(&row.get::<_, String>(6)?),
                        start_date: row.get(7)?,
                        return_date: row.get(8)?,
                    }),
                    None => None,
                };
                Ok(CarWithCurrentRental {
                    car,
                    current_rental,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cars)
    }

    /// Replace a car's model and plate. The status is left alone.
    ///
    /// Returns `true` if a car was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_car(&self, id: RecordId, model: &str, plate_number: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE cars SET model = ?1, plate_number = ?2 WHERE id = ?3",
            params![model, plate_number, id],
        )?;
        Ok(affected > 0)
    }

    /// Overwrite a car's status.
    ///
    /// Returns `true` if a car was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_car_status(&self, id: RecordId, status: CarStatus) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE cars SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )?;
        debug!("Set car {} status to {} ({} row)", id, status, affected);
        Ok(affected > 0)
    }

    /// Count cars per status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn car_stats(&self) -> Result<CarStats> {
        let stats = self.conn.query_row(
            r"
            SELECT COUNT(*),
                   COALESCE(SUM(status = 'available'), 0),
                   COALESCE(SUM(status = 'rented'), 0),
                   COALESCE(SUM(status = 'reserved'), 0)
            FROM cars
            ",
            [],
            |row| {
                Ok(CarStats {
                    total: row.get(0)?,
                    available: row.get(1)?,
                    rented: row.get(2)?,
                    reserved: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    // === Clients ===

    /// Insert a client and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_client(&self, client: &NewClient, created_at: DateTime<Utc>) -> Result<RecordId> {
        self.conn.execute(
            r"
            INSERT INTO clients
                (full_name, passport_id, driving_license, passport_image, license_image, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                client.full_name,
                client.passport_id,
                client.driving_license,
                client.passport_image,
                client.license_image,
                format_timestamp(created_at),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted client with id {}", id);
        Ok(id)
    }

    /// Get a client by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_client(&self, id: RecordId) -> Result<Option<Client>> {
        let client = self
            .conn
            .query_row(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
                [id],
                Self::row_to_client,
            )
            .optional()?;
        Ok(client)
    }

    /// List all clients, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at DESC, id DESC"
        ))?;

        let clients = stmt
            .query_map([], Self::row_to_client)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(clients)
    }

    /// Replace a client's name and identity document numbers.
    ///
    /// Returns `true` if a client was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_client(
        &self,
        id: RecordId,
        full_name: &str,
        passport_id: Option<&str>,
        driving_license: Option<&str>,
    ) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE clients SET full_name = ?1, passport_id = ?2, driving_license = ?3 WHERE id = ?4",
            params![full_name, passport_id, driving_license, id],
        )?;
        Ok(affected > 0)
    }

    /// Replace both document image references of a client.
    ///
    /// Returns `true` if a client was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_client_documents(
        &self,
        id: RecordId,
        passport_image: Option<&str>,
        license_image: Option<&str>,
    ) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE clients SET passport_image = ?1, license_image = ?2 WHERE id = ?3",
            params![passport_image, license_image, id],
        )?;
        Ok(affected > 0)
    }

    // === Rentals ===

    /// Insert a rental and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_rental(
        &self,
        fields: &RentalFields,
        status: RentalStatus,
        created_at: DateTime<Utc>,
    ) -> Result<RecordId> {
        self.conn.execute(
            r"
            INSERT INTO rentals
                (car_id, client_id, start_date, return_date, rental_price, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                fields.car_id,
                fields.client_id,
                fields.start_date,
                fields.return_date,
                fields.rental_price,
                status.to_string(),
                format_timestamp(created_at),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted rental with id {} for car {}", id, fields.car_id);
        Ok(id)
    }

    /// Get a rental by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_rental(&self, id: RecordId) -> Result<Option<Rental>> {
        let rental = self
            .conn
            .query_row(
                &format!("SELECT {RENTAL_COLUMNS} FROM rentals r WHERE r.id = ?1"),
                [id],
                Self::row_to_rental,
            )
            .optional()?;
        Ok(rental)
    }

    /// List rentals joined with car and client names, newest first.
    ///
    /// Rentals whose car or client no longer exists are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_rental_details(&self) -> Result<Vec<RentalDetails>> {
        let mut stmt = self.conn.prepare(&format!(
            r"
            SELECT {RENTAL_COLUMNS}, c.model, c.plate_number, k.full_name
            FROM rentals r
            JOIN cars c ON c.id = r.car_id
            JOIN clients k ON k.id = r.client_id
            ORDER BY r.created_at DESC, r.id DESC
            "
        ))?;

        let rentals = stmt
            .query_map([], |row| {
                Ok(RentalDetails {
                    rental: Self::row_to_rental(row)?,
                    car_model: row.get(8)?,
                    plate_number: row.get(9)?,
                    client_name: row.get(10)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rentals)
    }

    /// Replace every editable rental field except the status.
    ///
    /// Returns `true` if a rental was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_rental(&self, id: RecordId, fields: &RentalFields) -> Result<bool> {
        let affected = self.conn.execute(
            r"
            UPDATE rentals
            SET car_id = ?1, client_id = ?2, start_date = ?3, return_date = ?4, rental_price = ?5
            WHERE id = ?6
            ",
            params![
                fields.car_id,
                fields.client_id,
                fields.start_date,
                fields.return_date,
                fields.rental_price,
                id,
            ],
        )?;
        Ok(affected > 0)
    }

    /// Overwrite a rental's status.
    ///
    /// Returns `true` if a rental was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_rental_status(&self, id: RecordId, status: RentalStatus) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE rentals SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )?;
        Ok(affected > 0)
    }

    /// Sum of every rental price, whatever the rental status. 0 when empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn total_rental_price(&self) -> Result<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(rental_price), 0.0) FROM rentals",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // === Expenses ===

    /// Insert an expense and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_expense(
        &self,
        expense: &NewExpense,
        created_at: DateTime<Utc>,
    ) -> Result<RecordId> {
        self.conn.execute(
            r"
            INSERT INTO expenses (category, amount, expense_date, car_id, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                expense.category,
                expense.amount,
                expense.expense_date,
                expense.car_id,
                expense.description,
                format_timestamp(created_at),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted expense with id {}", id);
        Ok(id)
    }

    /// Get an expense by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_expense(&self, id: RecordId) -> Result<Option<Expense>> {
        let expense = self
            .conn
            .query_row(
                &format!("SELECT {EXPENSE_COLUMNS} FROM expenses e WHERE e.id = ?1"),
                [id],
                Self::row_to_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// List expenses joined with their car, most recent expense date first.
    ///
    /// Expenses without a car, or whose car was deleted, are kept with empty
    /// car fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_expense_details(&self) -> Result<Vec<ExpenseDetails>> {
        let mut stmt = self.conn.prepare(&format!(
            r"
            SELECT {EXPENSE_COLUMNS}, c.model, c.plate_number
            FROM expenses e
            LEFT JOIN cars c ON c.id = e.car_id
            ORDER BY e.expense_date DESC, e.id DESC
            "
        ))?;

        let expenses = stmt
            .query_map([], |row| {
                Ok(ExpenseDetails {
                    expense: Self::row_to_expense(row)?,
                    car_model: row.get(7)?,
                    plate_number: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Sum of every expense amount. 0 when empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn total_expense_amount(&self) -> Result<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expenses",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // === Any collection ===

    /// Delete a record by ID.
    ///
    /// Returns `true` if a record was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, collection: Collection, id: RecordId) -> Result<bool> {
        let affected = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.table()),
            [id],
        )?;
        debug!("Deleted {} record {} ({} row)", collection, id, affected);
        Ok(affected > 0)
    }

    /// Count the records of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, collection: Collection) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            cars: self.count(Collection::Cars)?,
            clients: self.count(Collection::Clients)?,
            rentals: self.count(Collection::Rentals)?,
            expenses: self.count(Collection::Expenses)?,
            db_size_bytes,
        })
    }

    // === Row mapping ===

    fn row_to_car(row: &rusqlite::Row) -> rusqlite::Result<Car> {
        Ok(Car {
            id: row.get(0)?,
            model: row.get(1)?,
            plate_number: row.get(2)?,
            status: parse_car_status(&row.get::<_, String>(3)?),
            created_at: parse_timestamp(&row.get::<_, String>(4)?),
        })
    }

    fn row_to_client(row: &rusqlite::Row) -> rusqlite::Result<Client> {
        Ok(Client {
            id: row.get(0)?,
            full_name: row.get(1)?,
            passport_id: row.get(2)?,
            driving_license: row.get(3)?,
            passport_image: row.get(4)?,
            license_image: row.get(5)?,
            created_at: parse_timestamp(&row.get::<_, String>(6)?),
        })
    }

    fn row_to_rental(row: &rusqlite::Row) -> rusqlite::Result<Rental> {
        Ok(Rental {
            id: row.get(0)?,
            car_id: row.get(1)?,
            client_id: row.get(2)?,
            start_date: row.get(3)?,
            return_date: row.get(4)?,
            rental_price: row.get(5)?,
            status: parse_rental_status(&row.get::<_, String>(6)?),
            created_at: parse_timestamp(&row.get::<_, String>(7)?),
        })
    }

    fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        Ok(Expense {
            id: row.get(0)?,
            category: row.get(1)?,
            amount: row.get(2)?,
            expense_date: row.get(3)?,
            car_id: row.get(4)?,
            description: row.get(5)?,
            created_at: parse_timestamp(&row.get::<_, String>(6)?),
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of cars.
    pub cars: i64,
    /// Number of clients.
    pub clients: i64,
    /// Number of rentals.
    pub rentals: i64,
    /// Number of expenses.
    pub expenses: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Fixed-width RFC 3339 so that timestamps sort as text.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| {
            warn!("Unparsable timestamp: {}, using now", raw);
            Utc::now()
        },
        |dt| dt.with_timezone(&Utc),
    )
}

fn parse_car_status(raw: &str) -> CarStatus {
    raw.parse().unwrap_or_else(|_| {
        warn!("Unknown car status: {}, defaulting to available", raw);
        CarStatus::Available
    })
}

fn parse_rental_status(raw: &str) -> RentalStatus {
    raw.parse().unwrap_or_else(|_| {
        warn!("Unknown rental status: {}, defaulting to returned", raw);
        RentalStatus::Returned
    })
}
