//! Core record types for fleetdesk.
//!
//! This module defines the four stored collections (cars, clients, rentals,
//! expenses), their status enums, the joined read models returned by the
//! store, and the raw input forms accepted by the mutating operations.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity of a stored record (the `SQLite` row id).
pub type RecordId = i64;

/// Format of every calendar date stored by fleetdesk.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The stored collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Fleet vehicles.
    Cars,
    /// Renting customers.
    Clients,
    /// Rental agreements.
    Rentals,
    /// Operating expenses.
    Expenses,
}

impl Collection {
    /// Name of the backing table.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Cars => "cars",
            Self::Clients => "clients",
            Self::Rentals => "rentals",
            Self::Expenses => "expenses",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Availability of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    /// Free to be rented.
    #[default]
    Available,
    /// Out with a client.
    Rented,
    /// Held for an upcoming rental.
    Reserved,
}

impl std::fmt::Display for CarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Rented => write!(f, "rented"),
            Self::Reserved => write!(f, "reserved"),
        }
    }
}

impl FromStr for CarStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(Self::Available),
            "rented" => Ok(Self::Rented),
            "reserved" => Ok(Self::Reserved),
            other => Err(Error::validation(
                "status",
                format!("unknown car status '{other}'"),
            )),
        }
    }
}

/// Lifecycle state of a rental: `reserved -> rented -> returned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    /// Booked, car not handed over yet.
    Reserved,
    /// Car is with the client.
    Rented,
    /// Car came back.
    Returned,
}

impl RentalStatus {
    /// Reserved and rented rentals are active; returned ones are closed.
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Returned)
    }

    /// The car status a rental in this state imposes on its paired car.
    #[must_use]
    pub fn car_status(self) -> CarStatus {
        match self {
            Self::Reserved => CarStatus::Reserved,
            Self::Rented => CarStatus::Rented,
            Self::Returned => CarStatus::Available,
        }
    }
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reserved => write!(f, "reserved"),
            Self::Rented => write!(f, "rented"),
            Self::Returned => write!(f, "returned"),
        }
    }
}

impl FromStr for RentalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reserved" => Ok(Self::Reserved),
            "rented" => Ok(Self::Rented),
            "returned" => Ok(Self::Returned),
            other => Err(Error::validation(
                "status",
                format!("unknown rental status '{other}'"),
            )),
        }
    }
}

/// A vehicle of the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    /// Row identity.
    pub id: RecordId,
    /// Model name, e.g. "Dacia Logan".
    pub model: String,
    /// Plate number. A display key only; duplicates are allowed.
    pub plate_number: String,
    /// Current availability.
    pub status: CarStatus,
    /// When the car was added.
    pub created_at: DateTime<Utc>,
}

/// Dates of the active rental currently holding a car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRental {
    /// The rental holding the car.
    pub rental_id: RecordId,
    /// State of that rental (reserved or rented).
    pub status: RentalStatus,
    /// First rental day.
    pub start_date: String,
    /// Agreed return day.
    pub return_date: String,
}

/// A car joined with its most recently created active rental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarWithCurrentRental {
    /// The car itself.
    #[serde(flatten)]
    pub car: Car,
    /// Newest reserved/rented rental for the car, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_rental: Option<CurrentRental>,
}

/// Car counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarStats {
    /// All cars.
    pub total: i64,
    /// Cars with status available.
    pub available: i64,
    /// Cars with status rented.
    pub rented: i64,
    /// Cars with status reserved.
    pub reserved: i64,
}

/// A renting customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Row identity.
    pub id: RecordId,
    /// Full name as printed on the contract.
    pub full_name: String,
    /// Passport number. Not unique.
    pub passport_id: Option<String>,
    /// Driving license number.
    pub driving_license: Option<String>,
    /// Opaque reference to the stored passport scan.
    pub passport_image: Option<String>,
    /// Opaque reference to the stored license scan.
    pub license_image: Option<String>,
    /// When the client was registered.
    pub created_at: DateTime<Utc>,
}

/// Input for registering a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    /// Full name (required).
    pub full_name: String,
    /// Passport number.
    pub passport_id: Option<String>,
    /// Driving license number.
    pub driving_license: Option<String>,
    /// Passport scan reference.
    pub passport_image: Option<String>,
    /// License scan reference.
    pub license_image: Option<String>,
}

/// A rental agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    /// Row identity.
    pub id: RecordId,
    /// The paired car.
    pub car_id: RecordId,
    /// The renting client.
    pub client_id: RecordId,
    /// First rental day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Agreed return day, `YYYY-MM-DD`.
    pub return_date: String,
    /// Agreed price.
    pub rental_price: f64,
    /// Lifecycle state.
    pub status: RentalStatus,
    /// When the rental was booked.
    pub created_at: DateTime<Utc>,
}

/// A rental joined with its car and client names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalDetails {
    /// The rental itself.
    #[serde(flatten)]
    pub rental: Rental,
    /// Model of the paired car.
    pub car_model: String,
    /// Plate of the paired car.
    pub plate_number: String,
    /// Full name of the client.
    pub client_name: String,
}

/// Raw rental form input, as typed by the operator.
///
/// Every field arrives as text; [`RentalRequest::validate`] turns it into
/// [`RentalFields`] or rejects it before anything touches the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRequest {
    /// Car identity.
    pub car_id: String,
    /// Client identity.
    pub client_id: String,
    /// First rental day.
    pub start_date: String,
    /// Agreed return day.
    pub return_date: String,
    /// Price; absent or unparsable text counts as 0.
    pub rental_price: Option<String>,
}

/// Validated rental fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalFields {
    /// Car identity.
    pub car_id: RecordId,
    /// Client identity.
    pub client_id: RecordId,
    /// First rental day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Agreed return day, `YYYY-MM-DD`.
    pub return_date: String,
    /// Price, non-negative.
    pub rental_price: f64,
}

impl RentalRequest {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns a validation error if an identity or date is missing or
    /// malformed, or if the price parses to a negative or non-finite number.
    pub fn validate(&self) -> Result<RentalFields> {
        Ok(RentalFields {
            car_id: parse_id("car_id", &self.car_id)?,
            client_id: parse_id("client_id", &self.client_id)?,
            start_date: parse_date("start_date", &self.start_date)?,
            return_date: parse_date("return_date", &self.return_date)?,
            rental_price: parse_amount("rental_price", self.rental_price.as_deref())?,
        })
    }
}

/// An operating expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Row identity.
    pub id: RecordId,
    /// Free-form tag such as "maintenance" or "insurance".
    pub category: String,
    /// Amount spent.
    pub amount: f64,
    /// Day of the expense, `YYYY-MM-DD`.
    pub expense_date: String,
    /// Car the expense was for, if any.
    pub car_id: Option<RecordId>,
    /// Free text.
    pub description: Option<String>,
    /// When the expense was recorded.
    pub created_at: DateTime<Utc>,
}

/// An expense joined with its car, when it references one that still exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDetails {
    /// The expense itself.
    #[serde(flatten)]
    pub expense: Expense,
    /// Model of the referenced car.
    pub car_model: Option<String>,
    /// Plate of the referenced car.
    pub plate_number: Option<String>,
}

/// Input for recording an expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    /// Free-form tag (required).
    pub category: String,
    /// Amount spent, non-negative.
    pub amount: f64,
    /// Day of the expense, `YYYY-MM-DD`.
    pub expense_date: String,
    /// Car the expense was for.
    pub car_id: Option<RecordId>,
    /// Free text.
    pub description: Option<String>,
}

/// Parse a record identity typed as text.
///
/// # Errors
///
/// Returns a validation error if the text is empty or not an integer.
pub fn parse_id(field: &'static str, raw: &str) -> Result<RecordId> {
    let raw = require(field, raw)?;
    raw.parse()
        .map_err(|_| Error::validation(field, format!("'{raw}' is not a record id")))
}

/// Check a `YYYY-MM-DD` calendar date and return it trimmed.
///
/// The fixed-width shape matters: notices compare dates as strings.
///
/// # Errors
///
/// Returns a validation error if the text is empty, not zero-padded
/// `YYYY-MM-DD`, or not a real calendar day.
pub fn parse_date(field: &'static str, raw: &str) -> Result<String> {
    let raw = require(field, raw)?;
    if !date_shape().is_match(raw) || NaiveDate::parse_from_str(raw, DATE_FORMAT).is_err() {
        return Err(Error::validation(
            field,
            format!("'{raw}' is not a YYYY-MM-DD date"),
        ));
    }
    Ok(raw.to_string())
}

/// Parse a money amount the lenient way forms do: the longest leading
/// number counts, so `"150 MAD"` is 150 and `"1,5"` is 1. Absent text, or
/// text that does not start with a number, is 0.
///
/// # Errors
///
/// Returns a validation error if the amount parses but is negative or not
/// finite.
pub fn parse_amount(field: &'static str, raw: Option<&str>) -> Result<f64> {
    let amount = raw
        .and_then(|text| amount_prefix().find(text.trim()))
        .and_then(|number| number.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);
    check_amount(field, amount)
}

/// Reject negative or non-finite amounts.
///
/// # Errors
///
/// Returns a validation error for negative, infinite or NaN values.
pub fn check_amount(field: &'static str, amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::validation(
            field,
            format!("{amount} is not a non-negative amount"),
        ));
    }
    Ok(amount)
}

/// Trim a required text field, rejecting blanks.
///
/// # Errors
///
/// Returns a validation error if nothing but whitespace was given.
pub fn require<'a>(field: &'static str, raw: &'a str) -> Result<&'a str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "is required"));
    }
    Ok(trimmed)
}

/// Blank optional text is stored as absent.
#[must_use]
pub fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn date_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date shape pattern is valid"))
}

fn amount_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
            .expect("amount prefix pattern is valid")
    })
}
