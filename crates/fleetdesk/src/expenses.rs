//! Operating expenses.

use chrono::Utc;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{
    check_amount, non_blank, parse_date, require, Collection, Expense, ExpenseDetails, NewExpense,
    RecordId,
};
use crate::storage::Storage;

/// Records, lists and deletes expenses.
#[derive(Debug, Clone, Copy)]
pub struct ExpenseLedger<'a> {
    storage: &'a Storage,
}

impl<'a> ExpenseLedger<'a> {
    /// Create a ledger over the given store.
    #[must_use]
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record an expense.
    ///
    /// The referenced car, if any, is not checked for existence.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank category, a negative amount or
    /// a malformed date.
    pub fn add_expense(&self, expense: &NewExpense) -> Result<Expense> {
        let normalized = NewExpense {
            category: require("category", &expense.category)?.to_string(),
            amount: check_amount("amount", expense.amount)?,
            expense_date: parse_date("expense_date", &expense.expense_date)?,
            car_id: expense.car_id,
            description: non_blank(expense.description.as_deref()),
        };

        let id = self.storage.insert_expense(&normalized, Utc::now())?;
        info!(
            "Recorded {} expense {} of {}",
            normalized.category, id, normalized.amount
        );
        self.get_expense(id)
    }

    /// Get an expense.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such expense.
    pub fn get_expense(&self, id: RecordId) -> Result<Expense> {
        self.storage
            .get_expense(id)?
            .ok_or_else(|| Error::not_found(Collection::Expenses, id))
    }

    /// Every expense with its car, latest expense date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_expenses(&self) -> Result<Vec<ExpenseDetails>> {
        self.storage.list_expense_details()
    }

    /// Delete an expense.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such expense. Unlike an
    /// unknown rental id, which is ignored unless `rentals.strict_not_found`
    /// is set, this is always reported, and the CLI exits with code 2.
    pub fn delete_expense(&self, id: RecordId) -> Result<()> {
        if !self.storage.delete(Collection::Expenses, id)? {
            return Err(Error::not_found(Collection::Expenses, id));
        }
        info!("Deleted expense {}", id);
        Ok(())
    }
}
