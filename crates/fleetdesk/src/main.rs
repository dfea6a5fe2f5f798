//! `fleetdesk` - CLI for the fleetdesk library
//!
//! This binary provides the command-line interface for managing the fleet
//! database: cars, clients, rentals, expenses and the reports built on them.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use fleetdesk::cli::{
    CarCommand, Cli, ClientCommand, Command, ConfigCommand, ExpenseCommand, OutputFormat,
    RentalCommand, ReportCommand,
};
use fleetdesk::models::DATE_FORMAT;
use fleetdesk::{init_logging, Config, Fleet, NewExpense, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_client_fault() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load_from(cli.config.clone())?;

    // Config commands work without opening the database
    if let Command::Config(config_cmd) = cli.command {
        return handle_config(&config, config_cmd);
    }

    let fleet = Fleet::open(config)?;

    match cli.command {
        Command::Car(cmd) => handle_car(&fleet, cmd),
        Command::Client(cmd) => handle_client(&fleet, cmd),
        Command::Rental(cmd) => handle_rental(&fleet, cmd),
        Command::Expense(cmd) => handle_expense(&fleet, cmd),
        Command::Notices(report) => handle_notices(&fleet, &report),
        Command::Profit(cmd) => handle_profit(&fleet, cmd.format),
        Command::Dashboard(report) => handle_dashboard(&fleet, &report),
        Command::Status(cmd) => handle_status(&fleet, cmd.json),
        Command::Config(_) => Ok(()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_car(fleet: &Fleet, cmd: CarCommand) -> Result<()> {
    match cmd {
        CarCommand::Add {
            model,
            plate_number,
        } => {
            let car = fleet.cars().add_car(&model, &plate_number)?;
            println!("Added car {} ({} {})", car.id, car.model, car.plate_number);
        }
        CarCommand::List { format } => {
            let cars = fleet.car_status().cars_with_current_rental()?;
            if format == OutputFormat::Json {
                return print_json(&cars);
            }
            if cars.is_empty() {
                println!("No cars.");
            }
            for entry in &cars {
                let car = &entry.car;
                print!(
                    "{:>4}  {:<20} {:<12} {:<9}",
                    car.id, car.model, car.plate_number, car.status
                );
                match &entry.current_rental {
                    Some(rental) => println!(
                        "  {} -> {} (rental {})",
                        rental.start_date, rental.return_date, rental.rental_id
                    ),
                    None => println!(),
                }
            }
        }
        CarCommand::Edit {
            id,
            model,
            plate_number,
        } => {
            let car = fleet.cars().update_car(id, &model, &plate_number)?;
            println!("Updated car {} ({} {})", car.id, car.model, car.plate_number);
        }
        CarCommand::Status { id, status } => {
            let status = status.into();
            fleet.car_status().set_car_status(id, status)?;
            println!("Car {id} is now {status}");
        }
        CarCommand::Delete { id } => {
            fleet.cars().delete_car(id)?;
            println!("Deleted car {id}");
        }
        CarCommand::Stats { format } => {
            let stats = fleet.cars().car_stats()?;
            if format == OutputFormat::Json {
                return print_json(&stats);
            }
            println!("Total:      {}", stats.total);
            println!("Available:  {}", stats.available);
            println!("Reserved:   {}", stats.reserved);
            println!("Rented:     {}", stats.rented);
        }
        CarCommand::Drift { format } => {
            let drift = fleet.car_status().status_drift()?;
            if format == OutputFormat::Json {
                return print_json(&drift);
            }
            if drift.is_empty() {
                println!("Every car status matches its rentals.");
            }
            for d in &drift {
                println!(
                    "{:>4}  {:<20} {:<12} stored {:<9} expected {}",
                    d.car_id, d.model, d.plate_number, d.stored, d.expected
                );
            }
        }
    }
    Ok(())
}

fn handle_client(fleet: &Fleet, cmd: ClientCommand) -> Result<()> {
    let clients = fleet.clients();
    match cmd {
        ClientCommand::Add(args) => {
            let client = clients.add_client(&args.into())?;
            println!("Registered client {} ({})", client.id, client.full_name);
        }
        ClientCommand::List { format } => {
            let list = clients.list_clients()?;
            if format == OutputFormat::Json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No clients.");
            }
            for client in &list {
                println!(
                    "{:>4}  {:<24} passport {:<12} license {}",
                    client.id,
                    client.full_name,
                    client.passport_id.as_deref().unwrap_or("-"),
                    client.driving_license.as_deref().unwrap_or("-"),
                );
            }
        }
        ClientCommand::Edit {
            id,
            full_name,
            passport,
            license,
        } => {
            let client =
                clients.update_client(id, &full_name, passport.as_deref(), license.as_deref())?;
            println!("Updated client {} ({})", client.id, client.full_name);
        }
        ClientCommand::Docs {
            id,
            passport_image,
            license_image,
            clear,
        } => {
            let client = if clear {
                clients.clear_documents(id)?
            } else {
                clients.attach_documents(id, passport_image.as_deref(), license_image.as_deref())?
            };
            println!(
                "Client {}: passport scan {}, license scan {}",
                client.id,
                client.passport_image.as_deref().unwrap_or("-"),
                client.license_image.as_deref().unwrap_or("-"),
            );
        }
        ClientCommand::Delete { id } => {
            clients.delete_client(id)?;
            println!("Deleted client {id}");
        }
    }
    Ok(())
}

fn handle_rental(fleet: &Fleet, cmd: RentalCommand) -> Result<()> {
    let rentals = fleet.rentals();
    match cmd {
        RentalCommand::Create(args) => {
            let rental = rentals.create_rental(&args.into())?;
            println!(
                "Created rental {} for car {} ({} -> {}, {:.2})",
                rental.id, rental.car_id, rental.start_date, rental.return_date, rental.rental_price
            );
        }
        RentalCommand::List { format } => {
            let list = rentals.list_rentals()?;
            if format == OutputFormat::Json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No rentals.");
            }
            for details in &list {
                let r = &details.rental;
                println!(
                    "{:>4}  {:<9} {} -> {}  {:<20} {:<12} {:<24} {:>10.2}",
                    r.id,
                    r.status,
                    r.start_date,
                    r.return_date,
                    details.car_model,
                    details.plate_number,
                    details.client_name,
                    r.rental_price
                );
            }
        }
        RentalCommand::Status { id, status } => {
            let status = status.into();
            match rentals.update_rental_status(id, status)? {
                Some(rental) => println!("Rental {} is now {}", rental.id, rental.status),
                None => println!("No rental {id}; nothing changed"),
            }
        }
        RentalCommand::Edit { id, fields } => {
            match rentals.update_rental_details(id, &fields.into())? {
                Some(rental) => println!("Updated rental {}", rental.id),
                None => println!("No rental {id}; nothing changed"),
            }
        }
        RentalCommand::Delete { id } => {
            if rentals.delete_rental(id)? {
                println!("Deleted rental {id}");
            } else {
                println!("No rental {id}; nothing deleted");
            }
        }
    }
    Ok(())
}

fn handle_expense(fleet: &Fleet, cmd: ExpenseCommand) -> Result<()> {
    let expenses = fleet.expenses();
    match cmd {
        ExpenseCommand::Add {
            category,
            amount,
            date,
            car,
            description,
        } => {
            let expense_date =
                date.unwrap_or_else(|| fleet.today().format(DATE_FORMAT).to_string());
            let expense = expenses.add_expense(&NewExpense {
                category,
                amount,
                expense_date,
                car_id: car,
                description,
            })?;
            println!(
                "Recorded expense {} ({} {:.2} on {})",
                expense.id, expense.category, expense.amount, expense.expense_date
            );
        }
        ExpenseCommand::List { format } => {
            let list = expenses.list_expenses()?;
            if format == OutputFormat::Json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No expenses.");
            }
            for details in &list {
                let e = &details.expense;
                let car = match (&details.car_model, &details.plate_number) {
                    (Some(model), Some(plate)) => format!("{model} ({plate})"),
                    _ => "-".to_string(),
                };
                println!(
                    "{:>4}  {}  {:<14} {:>10.2}  {:<28} {}",
                    e.id,
                    e.expense_date,
                    e.category,
                    e.amount,
                    car,
                    e.description.as_deref().unwrap_or("")
                );
            }
        }
        ExpenseCommand::Delete { id } => {
            expenses.delete_expense(id)?;
            println!("Deleted expense {id}");
        }
    }
    Ok(())
}

fn handle_notices(fleet: &Fleet, report: &ReportCommand) -> Result<()> {
    let today = report.today.unwrap_or_else(|| fleet.today());
    let notices = fleet.notices().notices_on(today)?;

    if report.format == OutputFormat::Json {
        return print_json(&notices);
    }
    print_notices(&notices);
    Ok(())
}

fn print_notices(notices: &[fleetdesk::Notice]) {
    if notices.is_empty() {
        println!("No notices.");
        return;
    }
    for notice in notices {
        let r = &notice.rental;
        println!(
            "[{:<7}] {:<14} {} -> {}  {} ({})  {}",
            notice.severity,
            notice.kind,
            r.start_date,
            r.return_date,
            r.model,
            r.plate_number,
            r.full_name
        );
    }
}

fn handle_profit(fleet: &Fleet, format: OutputFormat) -> Result<()> {
    let report = fleet.finance().profit_report()?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }
    println!("Revenue:   {:>12.2}", report.total_revenue);
    println!("Expenses:  {:>12.2}", report.total_expenses);
    println!("Profit:    {:>12.2}", report.total_profit);
    println!("Rentals:   {:>12}", report.rentals.len());
    Ok(())
}

fn handle_dashboard(fleet: &Fleet, report: &ReportCommand) -> Result<()> {
    let today = report.today.unwrap_or_else(|| fleet.today());
    let dashboard = fleet.finance().dashboard(today)?;

    if report.format == OutputFormat::Json {
        return print_json(&dashboard);
    }

    let stats = dashboard.car_stats;
    println!("fleetdesk dashboard for {today}");
    println!("-------------------------------");
    println!(
        "Cars:      {} total, {} available, {} reserved, {} rented",
        stats.total, stats.available, stats.reserved, stats.rented
    );
    println!("Revenue:   {:>12.2}", dashboard.total_revenue);
    println!("Expenses:  {:>12.2}", dashboard.total_expenses);
    println!("Profit:    {:>12.2}", dashboard.total_profit);
    println!();
    print_notices(&dashboard.notices);
    Ok(())
}

fn handle_status(fleet: &Fleet, json: bool) -> Result<()> {
    let stats = fleet.storage().stats()?;
    if json {
        let status = serde_json::json!({
            "database_path": fleet.storage().path(),
            "stats": stats,
        });
        return print_json(&status);
    }

    println!("fleetdesk status");
    println!("----------------");
    println!("Database:      {}", fleet.storage().path().display());
    println!("Size:          {} bytes", stats.db_size_bytes);
    println!("Cars:          {}", stats.cars);
    println!("Clients:       {}", stats.clients);
    println!("Rentals:       {}", stats.rentals);
    println!("Expenses:      {}", stats.expenses);
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                return print_json(config);
            }
            println!("Current Configuration");
            println!("=====================");
            println!();
            println!("[Storage]");
            println!("  Database path:         {}", config.database_path().display());
            println!();
            println!("[Rentals]");
            println!(
                "  Require available car: {}",
                config.rentals.require_available_car
            );
            println!("  Strict not found:      {}", config.rentals.strict_not_found);
            println!();
            println!("[Notices]");
            println!("  UTC offset (hours):    {}", config.notices.utc_offset_hours);
            println!();
            println!("[Backup]");
            println!("  Log snapshots:         {}", config.backup.log_snapshots);
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
