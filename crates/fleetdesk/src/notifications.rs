//! Rental notices.
//!
//! Notices are derived on every read from the rental list and a calendar
//! day; nothing is stored. Dates are compared as `YYYY-MM-DD` text, which
//! orders the same way as the days themselves.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{RecordId, RentalDetails, RentalStatus, DATE_FORMAT};
use crate::storage::Storage;

/// What a notice is about. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A reservation starts today.
    StartToday,
    /// A reservation starts tomorrow.
    StartTomorrow,
    /// A rented car is due back today.
    ReturnToday,
    /// A rented car is past its return date.
    Overdue,
}

impl NoticeKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 4] = [
        Self::StartToday,
        Self::StartTomorrow,
        Self::ReturnToday,
        Self::Overdue,
    ];

    /// How urgent notices of this kind are.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::StartToday | Self::ReturnToday => Severity::Warning,
            Self::StartTomorrow => Severity::Info,
            Self::Overdue => Severity::Danger,
        }
    }

    fn applies(self, rental: &RentalDetails, today: &str, tomorrow: &str) -> bool {
        let r = &rental.rental;
        match self {
            Self::StartToday => r.status == RentalStatus::Reserved && r.start_date == today,
            Self::StartTomorrow => r.status == RentalStatus::Reserved && r.start_date == tomorrow,
            Self::ReturnToday => r.status == RentalStatus::Rented && r.return_date == today,
            Self::Overdue => r.status == RentalStatus::Rented && r.return_date.as_str() < today,
        }
    }
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartToday => write!(f, "start_today"),
            Self::StartTomorrow => write!(f, "start_tomorrow"),
            Self::ReturnToday => write!(f, "return_today"),
            Self::Overdue => write!(f, "overdue"),
        }
    }
}

/// Notice urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Heads-up.
    Info,
    /// Needs attention today.
    Warning,
    /// Already late.
    Danger,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Danger => write!(f, "danger"),
        }
    }
}

/// The rental a notice refers to, as it looked when the notice was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRental {
    /// The rental.
    pub rental_id: RecordId,
    /// Model of its car.
    pub model: String,
    /// Plate of its car.
    pub plate_number: String,
    /// Name of its client.
    pub full_name: String,
    /// First rental day.
    pub start_date: String,
    /// Agreed return day.
    pub return_date: String,
}

impl From<&RentalDetails> for NoticeRental {
    fn from(details: &RentalDetails) -> Self {
        Self {
            rental_id: details.rental.id,
            model: details.car_model.clone(),
            plate_number: details.plate_number.clone(),
            full_name: details.client_name.clone(),
            start_date: details.rental.start_date.clone(),
            return_date: details.rental.return_date.clone(),
        }
    }
}

/// A derived advisory about one rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// What the notice is about.
    #[serde(rename = "type")]
    pub kind: NoticeKind,
    /// How urgent it is.
    pub severity: Severity,
    /// The rental snapshot.
    pub rental: NoticeRental,
}

/// Derive the notices for `today`, grouped by kind in [`NoticeKind::ALL`]
/// order, rentals in the order given within each kind.
#[must_use]
pub fn derive_notices(today: NaiveDate, rentals: &[RentalDetails]) -> Vec<Notice> {
    // Only reachable at NaiveDate::MAX; nothing can start on a day that
    // does not exist.
    let tomorrow = today
        .checked_add_days(Days::new(1))
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    let today = today.format(DATE_FORMAT).to_string();
    let (today, tomorrow) = (today.as_str(), tomorrow.as_str());

    NoticeKind::ALL
        .iter()
        .flat_map(|&kind| {
            rentals
                .iter()
                .filter(move |rental| kind.applies(rental, today, tomorrow))
                .map(move |rental| Notice {
                    kind,
                    severity: kind.severity(),
                    rental: rental.into(),
                })
        })
        .collect()
}

/// Reads rentals and derives their notices.
#[derive(Debug, Clone, Copy)]
pub struct NotificationDeriver<'a> {
    storage: &'a Storage,
    today: NaiveDate,
}

impl<'a> NotificationDeriver<'a> {
    /// Create a deriver whose default day is `today`.
    #[must_use]
    pub fn new(storage: &'a Storage, today: NaiveDate) -> Self {
        Self { storage, today }
    }

    /// Notices for the default day.
    ///
    /// # Errors
    ///
    /// Returns an error if the rentals cannot be read.
    pub fn notices(&self) -> Result<Vec<Notice>> {
        self.notices_on(self.today)
    }

    /// Notices for an explicit day.
    ///
    /// # Errors
    ///
    /// Returns an error if the rentals cannot be read.
    pub fn notices_on(&self, today: NaiveDate) -> Result<Vec<Notice>> {
        let rentals = self.storage.list_rental_details()?;
        let notices = derive_notices(today, &rentals);
        debug!(
            "Derived {} notices from {} rentals for {}",
            notices.len(),
            rentals.len(),
            today
        );
        Ok(notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rental;
    use chrono::Utc;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn rental(id: RecordId, status: RentalStatus, start: &str, end: &str) -> RentalDetails {
        RentalDetails {
            rental: Rental {
                id,
                car_id: 1,
                client_id: 1,
                start_date: start.to_string(),
                return_date: end.to_string(),
                rental_price: 100.0,
                status,
                created_at: Utc::now(),
            },
            car_model: "Hyundai Accent".to_string(),
            plate_number: "77-D-1".to_string(),
            client_name: "Rachid".to_string(),
        }
    }

    #[test]
    fn test_reference_day() {
        let rentals = vec![
            rental(1, RentalStatus::Reserved, "2024-06-10", "2024-06-12"),
            rental(2, RentalStatus::Rented, "2024-06-01", "2024-06-05"),
            rental(3, RentalStatus::Returned, "2024-06-01", "2024-06-05"),
        ];

        let notices = derive_notices(day("2024-06-10"), &rentals);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].kind, NoticeKind::StartToday);
        assert_eq!(notices[0].rental.rental_id, 1);
        assert_eq!(notices[1].kind, NoticeKind::Overdue);
        assert_eq!(notices[1].severity, Severity::Danger);
        assert_eq!(notices[1].rental.rental_id, 2);
    }

    #[test]
    fn test_tomorrow_and_return_today() {
        let rentals = vec![
            rental(1, RentalStatus::Rented, "2024-06-08", "2024-06-10"),
            rental(2, RentalStatus::Reserved, "2024-06-11", "2024-06-15"),
            rental(3, RentalStatus::Rented, "2024-06-09", "2024-06-11"),
        ];

        let notices = derive_notices(day("2024-06-10"), &rentals);
        let kinds: Vec<_> = notices.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NoticeKind::StartTomorrow, NoticeKind::ReturnToday]);
        assert_eq!(notices[0].severity, Severity::Info);
        assert_eq!(notices[1].severity, Severity::Warning);
    }

    #[test]
    fn test_tomorrow_crosses_month_end() {
        let rentals = vec![rental(1, RentalStatus::Reserved, "2024-03-01", "2024-03-04")];
        let notices = derive_notices(day("2024-02-29"), &rentals);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::StartTomorrow);
    }

    #[test]
    fn test_reserved_past_start_is_silent() {
        let rentals = vec![rental(1, RentalStatus::Reserved, "2024-06-01", "2024-06-03")];
        assert!(derive_notices(day("2024-06-10"), &rentals).is_empty());
    }

    #[test]
    fn test_notice_json_shape() {
        let rentals = vec![rental(9, RentalStatus::Rented, "2024-06-01", "2024-06-02")];
        let notices = derive_notices(day("2024-06-10"), &rentals);
        let json = serde_json::to_value(&notices[0]).unwrap();

        assert_eq!(json["type"], "overdue");
        assert_eq!(json["severity"], "danger");
        assert_eq!(json["rental"]["full_name"], "Rachid");
        assert_eq!(json["rental"]["plate_number"], "77-D-1");
    }

    #[test]
    fn test_kind_severity_table() {
        assert_eq!(NoticeKind::StartToday.severity(), Severity::Warning);
        assert_eq!(NoticeKind::StartTomorrow.severity(), Severity::Info);
        assert_eq!(NoticeKind::ReturnToday.severity(), Severity::Warning);
        assert_eq!(NoticeKind::Overdue.severity(), Severity::Danger);
        assert_eq!(NoticeKind::StartTomorrow.to_string(), "start_tomorrow");
    }

    #[test]
    fn test_deriver_reads_store() {
        let storage = Storage::open_in_memory().unwrap();
        let deriver = NotificationDeriver::new(&storage, day("2024-06-10"));
        assert!(deriver.notices().unwrap().is_empty());
        assert!(deriver.notices_on(day("2030-01-01")).unwrap().is_empty());
    }
}
