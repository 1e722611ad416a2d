mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::process;

use commands::installment::InstallmentArgs;
use commands::schedule::LoanArgs;

/// Loan installment and amortization schedule calculations
#[derive(Parser)]
#[command(
    name = "amort",
    version,
    about = "Loan installment and amortization schedule calculations",
    long_about = "A CLI for fixed-rate loan calculations with decimal precision. \
                  Computes the monthly installment (EMI), month-by-month amortization \
                  schedules with optional extra payments, interest savings against \
                  the plain schedule, and per-year principal reduction."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the fixed monthly installment (EMI)
    Installment(InstallmentArgs),
    /// Month-by-month amortization schedule
    Schedule(LoanArgs),
    /// Interest saved and months reduced by extra payments
    Compare(LoanArgs),
    /// Schedule grouped by loan year
    Yearly(LoanArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("{}: logger: {}", "warning".yellow().bold(), e);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Installment(args) => commands::installment::run_installment(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Compare(args) => commands::schedule::run_compare(args),
        Commands::Yearly(args) => commands::schedule::run_yearly(args),
        Commands::Version => {
            println!("amort {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
