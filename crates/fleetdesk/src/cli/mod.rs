//! Command-line interface for fleetdesk.
//!
//! This module provides the CLI structure for the `fleetdesk` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    CarCommand, CarStatusArg, ClientArgs, ClientCommand, ConfigCommand, ExpenseCommand,
    OutputFormat, ProfitCommand, RentalArgs, RentalCommand, RentalStatusArg, ReportCommand,
    StatusCommand,
};

/// fleetdesk - Bookkeeping for a car rental agency
///
/// Keeps cars, clients, rentals and expenses, keeps car statuses in step
/// with rentals, and reports notices and profit.
#[derive(Debug, Parser)]
#[command(name = "fleetdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage cars
    #[command(subcommand)]
    Car(CarCommand),

    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Manage rentals
    #[command(subcommand)]
    Rental(RentalCommand),

    /// Manage expenses
    #[command(subcommand)]
    Expense(ExpenseCommand),

    /// Show rentals starting, due back or overdue
    Notices(ReportCommand),

    /// Show revenue, expenses and profit
    Profit(ProfitCommand),

    /// Show car counts, totals and notices together
    Dashboard(ReportCommand),

    /// Show database location and record counts
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
