//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::models::{CarStatus, NewClient, RecordId, RentalRequest, RentalStatus};

/// Car commands.
#[derive(Debug, Subcommand)]
pub enum CarCommand {
    /// Add a car to the fleet
    Add {
        /// Model name, e.g. "Dacia Logan"
        model: String,
        /// Plate number
        plate_number: String,
    },

    /// List cars with their current rental
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Change a car's model and plate
    Edit {
        /// Car id
        id: RecordId,
        /// New model name
        model: String,
        /// New plate number
        plate_number: String,
    },

    /// Override a car's status by hand
    Status {
        /// Car id
        id: RecordId,
        /// New status
        #[arg(value_enum)]
        status: CarStatusArg,
    },

    /// Delete a car (its rentals and expenses are kept)
    Delete {
        /// Car id
        id: RecordId,
    },

    /// Count cars per status
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// List cars whose status disagrees with their rentals
    Drift {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

/// Client commands.
#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// Register a client
    Add(ClientArgs),

    /// List clients
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Change a client's name and document numbers
    Edit {
        /// Client id
        id: RecordId,
        /// Full name
        full_name: String,
        /// Passport number
        #[arg(long)]
        passport: Option<String>,
        /// Driving license number
        #[arg(long)]
        license: Option<String>,
    },

    /// Attach or clear document scans
    Docs {
        /// Client id
        id: RecordId,
        /// Passport scan reference
        #[arg(long, conflicts_with = "clear")]
        passport_image: Option<String>,
        /// License scan reference
        #[arg(long, conflicts_with = "clear")]
        license_image: Option<String>,
        /// Remove both scans
        #[arg(long)]
        clear: bool,
    },

    /// Delete a client
    Delete {
        /// Client id
        id: RecordId,
    },
}

/// Fields of a new client.
#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Full name
    pub full_name: String,
    /// Passport number
    #[arg(long)]
    pub passport: Option<String>,
    /// Driving license number
    #[arg(long)]
    pub license: Option<String>,
    /// Passport scan reference
    #[arg(long)]
    pub passport_image: Option<String>,
    /// License scan reference
    #[arg(long)]
    pub license_image: Option<String>,
}

impl From<ClientArgs> for NewClient {
    fn from(args: ClientArgs) -> Self {
        Self {
            full_name: args.full_name,
            passport_id: args.passport,
            driving_license: args.license,
            passport_image: args.passport_image,
            license_image: args.license_image,
        }
    }
}

/// Rental commands.
#[derive(Debug, Subcommand)]
pub enum RentalCommand {
    /// Book a rental; the car becomes reserved
    Create(RentalArgs),

    /// List rentals with car and client
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Move a rental to a new status; the car follows
    Status {
        /// Rental id
        id: RecordId,
        /// New status
        #[arg(value_enum)]
        status: RentalStatusArg,
    },

    /// Replace a rental's car, client, dates and price
    Edit {
        /// Rental id
        id: RecordId,
        /// New fields
        #[command(flatten)]
        fields: RentalArgs,
    },

    /// Delete a rental; an unreturned car becomes available
    Delete {
        /// Rental id
        id: RecordId,
    },
}

/// Rental form fields, checked by the library rather than by clap.
#[derive(Debug, Args)]
pub struct RentalArgs {
    /// Car id
    pub car_id: String,
    /// Client id
    pub client_id: String,
    /// First day (YYYY-MM-DD)
    pub start_date: String,
    /// Return day (YYYY-MM-DD)
    pub return_date: String,
    /// Agreed price (0 when omitted)
    #[arg(short, long)]
    pub price: Option<String>,
}

impl From<RentalArgs> for RentalRequest {
    fn from(args: RentalArgs) -> Self {
        Self {
            car_id: args.car_id,
            client_id: args.client_id,
            start_date: args.start_date,
            return_date: args.return_date,
            rental_price: args.price,
        }
    }
}

/// Expense commands.
#[derive(Debug, Subcommand)]
pub enum ExpenseCommand {
    /// Record an expense
    Add {
        /// Category, e.g. maintenance, insurance, fuel
        category: String,
        /// Amount spent
        amount: f64,
        /// Day of the expense (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Car the expense was for
        #[arg(long)]
        car: Option<RecordId>,
        /// Free text
        #[arg(long)]
        description: Option<String>,
    },

    /// List expenses
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Delete an expense
    Delete {
        /// Expense id
        id: RecordId,
    },
}

/// Arguments of the read-only reports that depend on the day.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Day to report for (YYYY-MM-DD, defaults to today)
    #[arg(short, long)]
    pub today: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Profit command arguments.
#[derive(Debug, Args)]
pub struct ProfitCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Car status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CarStatusArg {
    /// Free to rent
    Available,
    /// Out with a client
    Rented,
    /// Held for a booking
    Reserved,
}

impl From<CarStatusArg> for CarStatus {
    fn from(arg: CarStatusArg) -> Self {
        match arg {
            CarStatusArg::Available => Self::Available,
            CarStatusArg::Rented => Self::Rented,
            CarStatusArg::Reserved => Self::Reserved,
        }
    }
}

/// Rental status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RentalStatusArg {
    /// Booked
    Reserved,
    /// Handed over
    Rented,
    /// Brought back
    Returned,
}

impl From<RentalStatusArg> for RentalStatus {
    fn from(arg: RentalStatusArg) -> Self {
        match arg {
            RentalStatusArg::Reserved => Self::Reserved,
            RentalStatusArg::Rented => Self::Rented,
            RentalStatusArg::Returned => Self::Returned,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}
