//! `SQLite` schema definitions for fleetdesk.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.
//!
//! Cross-collection references (`rentals.car_id`, `expenses.car_id`, ...)
//! carry no foreign keys: deleting a car leaves its rentals in place.

/// SQL statement to create the cars table.
pub const CREATE_CARS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS cars (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    plate_number TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'available',
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the clients table.
pub const CREATE_CLIENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    passport_id TEXT,
    driving_license TEXT,
    passport_image TEXT,
    license_image TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the rentals table.
pub const CREATE_RENTALS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rentals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    car_id INTEGER NOT NULL,
    client_id INTEGER NOT NULL,
    start_date TEXT NOT NULL,
    return_date TEXT NOT NULL,
    rental_price REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the expenses table.
pub const CREATE_EXPENSES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    amount REAL NOT NULL DEFAULT 0,
    expense_date TEXT NOT NULL,
    car_id INTEGER,
    description TEXT,
    created_at TEXT NOT NULL
)
";

/// Index backing the current-rental lookup per car.
pub const CREATE_RENTAL_CAR_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rentals_car_status ON rentals(car_id, status, created_at DESC)
";

/// Index for status scans (notices).
pub const CREATE_RENTAL_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rentals_status ON rentals(status)
";

/// Index for listing expenses by date.
pub const CREATE_EXPENSE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(expense_date DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_CARS_TABLE,
    CREATE_CLIENTS_TABLE,
    CREATE_RENTALS_TABLE,
    CREATE_EXPENSES_TABLE,
    CREATE_RENTAL_CAR_INDEX,
    CREATE_RENTAL_STATUS_INDEX,
    CREATE_EXPENSE_DATE_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_rentals_table_contains_required_columns() {
        assert!(CREATE_RENTALS_TABLE.contains("car_id INTEGER NOT NULL"));
        assert!(CREATE_RENTALS_TABLE.contains("client_id INTEGER NOT NULL"));
        assert!(CREATE_RENTALS_TABLE.contains("rental_price REAL"));
        assert!(CREATE_RENTALS_TABLE.contains("status TEXT NOT NULL"));
        assert!(!CREATE_RENTALS_TABLE.contains("REFERENCES"));
    }

    #[test]
    fn test_cars_default_to_available() {
        assert!(CREATE_CARS_TABLE.contains("DEFAULT 'available'"));
    }
}
