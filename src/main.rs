#[cfg(feature = "pdf")]
mod chart;
mod cli;
mod csv_export;
mod db;
mod error;
mod fmt;
mod models;
#[cfg(feature = "pdf")]
mod pdf;
mod present;
mod range;
mod reports;
mod session;
mod settings;
mod source;
mod tui;

use clap::Parser;

use cli::{Cli, Commands, ExportCommands};
use csv_export::CsvKind;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            church,
            member_table,
            user,
        } => cli::init::run(data_dir, church, member_table, user),
        Commands::Demo => cli::demo::run(),
        Commands::Status => cli::status::run(),
        Commands::Report { range, mode } => cli::report::run(range, mode),
        Commands::Export { command } => match command {
            #[cfg(feature = "pdf")]
            ExportCommands::Pdf { range, output } => cli::export::pdf(range, output),
            ExportCommands::Members { range, output } => cli::export::csv(CsvKind::MemberSummary, range, output),
            ExportCommands::Events { range, output } => cli::export::csv(CsvKind::EventSummary, range, output),
            ExportCommands::Tithes { range, output } => cli::export::csv(CsvKind::AllTithes, range, output),
            ExportCommands::All { range, output_dir } => cli::export::all(range, output_dir),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
