//! Revenue, expenses and profit, plus the dashboard summary built on them.
//!
//! Revenue is the sum of every rental price, reservations and returned
//! rentals alike. Nothing is cached; each call sums the store again.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CarStats, RentalDetails};
use crate::notifications::{Notice, NotificationDeriver};
use crate::storage::Storage;

/// Totals and the rentals behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitReport {
    /// Sum of rental prices.
    pub total_revenue: f64,
    /// Sum of expense amounts.
    pub total_expenses: f64,
    /// Revenue minus expenses. May be negative.
    pub total_profit: f64,
    /// Every listed rental, newest first.
    pub rentals: Vec<RentalDetails>,
}

/// One-read overview of the business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Car counts per status.
    pub car_stats: CarStats,
    /// Sum of rental prices.
    pub total_revenue: f64,
    /// Sum of expense amounts.
    pub total_expenses: f64,
    /// Revenue minus expenses.
    pub total_profit: f64,
    /// Notices for the dashboard's day.
    pub notices: Vec<Notice>,
}

/// Read-only money queries.
#[derive(Debug, Clone, Copy)]
pub struct FinancialAggregator<'a> {
    storage: &'a Storage,
}

impl<'a> FinancialAggregator<'a> {
    /// Create an aggregator over the given store.
    #[must_use]
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Sum of all rental prices. 0 without rentals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn total_revenue(&self) -> Result<f64> {
        self.storage.total_rental_price()
    }

    /// Sum of all expense amounts. 0 without expenses.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn total_expenses(&self) -> Result<f64> {
        self.storage.total_expense_amount()
    }

    /// Revenue minus expenses.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn total_profit(&self) -> Result<f64> {
        Ok(self.total_revenue()? - self.total_expenses()?)
    }

    /// Totals together with the rental listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn profit_report(&self) -> Result<ProfitReport> {
        let total_revenue = self.total_revenue()?;
        let total_expenses = self.total_expenses()?;
        Ok(ProfitReport {
            total_revenue,
            total_expenses,
            total_profit: total_revenue - total_expenses,
            rentals: self.storage.list_rental_details()?,
        })
    }

    /// Car counts, totals and the notices for `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let total_revenue = self.total_revenue()?;
        let total_expenses = self.total_expenses()?;
        Ok(Dashboard {
            car_stats: self.storage.car_stats()?,
            total_revenue,
            total_expenses,
            total_profit: total_revenue - total_expenses,
            notices: NotificationDeriver::new(self.storage, today).notices()?,
        })
    }
}
