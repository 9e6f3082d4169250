use std::fs::File;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use serde::Serialize;
use simplelog::{Config, LevelFilter, WriteLogger};

use printdeck::panic_handler;
use printdeck::print::{LayoutMode, PrintMode, compute_page_selection};
use printdeck::settings;

#[derive(Parser)]
#[command(
    name = "printdeck",
    about = "Page selection and print settings for document printing",
    version
)]
struct Cli {
    /// Level written to printdeck.log
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the pages a print request covers and print them as JSON
    Select(SelectArgs),
    /// Show the settings file location and the effective settings
    Config,
}

#[derive(Args)]
struct SelectArgs {
    /// Number of pages in the document
    #[arg(long)]
    pages: usize,

    /// all, current or custom
    #[arg(long, default_value = "all")]
    mode: PrintMode,

    /// Current page (1-indexed)
    #[arg(long, default_value_t = 1)]
    current: usize,

    /// Viewer layout, e.g. Single, Facing, CoverFacing
    #[arg(long, default_value = "Single")]
    layout: LayoutMode,

    /// Custom range expression, e.g. "1-3,5,iv"
    #[arg(long, default_value = "")]
    range: String,

    /// Comma-separated page labels, one per page
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Serialize)]
struct SelectionReport {
    mode: PrintMode,
    layout: String,
    count: usize,
    pages: Vec<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        cli.log_level.into(),
        Config::default(),
        File::create("printdeck.log").context("Failed to create printdeck.log")?,
    )?;
    panic_handler::initialize_panic_handler();

    info!("Starting printdeck");
    settings::load_settings();

    match cli.command {
        Commands::Select(args) => run_select(&args)?,
        Commands::Config => run_config()?,
    }

    info!("Shutting down printdeck");
    Ok(())
}

fn run_select(args: &SelectArgs) -> Result<()> {
    let selection = compute_page_selection(
        args.mode,
        args.current,
        args.layout,
        &args.range,
        &args.labels,
        args.pages,
    );
    debug!("Selected {} of {} pages", selection.len(), args.pages);

    let report = SelectionReport {
        mode: args.mode,
        layout: args.layout.to_string(),
        count: selection.len(),
        pages: selection.into(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize selection")?
    );
    Ok(())
}

fn run_config() -> Result<()> {
    match settings::settings_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config directory, using defaults"),
    }
    let yaml = serde_yaml::to_string(&settings::current_settings())
        .context("Failed to serialize settings")?;
    print!("{yaml}");
    Ok(())
}
