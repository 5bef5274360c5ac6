#![cfg(not(tarpaulin_include))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::PathBuf;
use taskboard::config::{Config, DEFAULT_CONFIG_FILE};
use taskboard::credentials::{self, Role};
use taskboard::daily::{self, date_key};
use taskboard::downloader::to_csv;
use taskboard::loader::from_csv;
use taskboard::{FileWorkbook, SheetStore, Tracker};

#[derive(Parser)]
#[command(name = "cli", about = "Maintain the task tracking workbook")]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "TASKBOARD_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing worksheets and the bootstrap Master account
    Init,

    /// Replace a worksheet with the contents of a CSV file
    Import {
        sheet: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write a worksheet as CSV
    Export {
        sheet: String,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Append an account to the Credentials sheet
    AddUser {
        username: String,
        /// Full name, as used in the Goals and Daily Updates sheets
        name: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long, default_value = "User")]
        role: String,
    },

    /// Delete the first Credentials row containing the username
    DeleteUser { username: String },

    /// List accounts
    Users,

    /// Add one Daily Updates column per day in a range (YYYY-MM-DD)
    AddDates { from: NaiveDate, to: NaiveDate },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let mut store = FileWorkbook::open(&config.store.path, &config.store.workbook)?;

    match cli.command {
        Commands::Init => {
            let mut tracker = Tracker::new(store, &config.cache);
            let created = tracker.ensure_schema()?;
            println!("Created {} worksheets", created.len());
            if let Some(bootstrap) = &config.bootstrap {
                if tracker.bootstrap_master(bootstrap)? {
                    println!("Created Master account '{}'", bootstrap.username);
                }
            }
        }
        Commands::Import { sheet, file } => {
            let rows = from_csv(&file)?;
            let count = rows.len();
            store.put_rows(&sheet, rows)?;
            info!("Imported {} into '{}'", file.display(), sheet);
            println!("Imported {} rows into '{}'", count, sheet);
        }
        Commands::Export { sheet, output } => {
            let csv = to_csv(&store.values(&sheet)?);
            match output {
                Some(path) => fs::write(path, csv)?,
                None => print!("{}", csv),
            }
        }
        Commands::AddUser {
            username,
            name,
            password,
            role,
        } => {
            let role: Role = role.parse()?;
            let row = credentials::add_user(&mut store, &username, &password, &name, role)?;
            println!("Added '{}' at row {}", username, row);
        }
        Commands::DeleteUser { username } => {
            let row = credentials::delete_user(&mut store, &username)?;
            println!("Deleted row {}", row);
        }
        Commands::Users => {
            for cred in credentials::load_credentials(&store)?.iter() {
                println!("{}\t{}\t{}", cred.username, cred.full_name, cred.role);
            }
        }
        Commands::AddDates { from, to } => {
            let keys: Vec<String> = from.iter_days().take_while(|d| *d <= to).map(date_key).collect();
            let added = daily::add_date_columns(&mut store, &keys)?;
            println!("Added {} date columns", added);
        }
    }

    Ok(())
}
