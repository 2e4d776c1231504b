use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod card;
mod card_table;
mod controller;
mod domain;
mod drag;
mod events;
mod model;
mod presentation;
mod prompt;
mod row_cursor;
mod sheet;
mod sizing;
mod table;
mod ui;

use controller::Controller;
use domain::{CardConfig, CardError, NavigationPolicy};
use model::{Model, Status};
use sheet::Sheet;
use table::Table;
use ui::TableUI;

/// Show the records of a table as a list of field/value cards.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// csv, parquet, arrow or workbook file
    path: String,

    /// Behaviour at the first and last record
    #[arg(long, value_enum, default_value_t = NavigationPolicy::Clamp)]
    navigation: NavigationPolicy,

    #[arg(long, default_value_t = 40)]
    max_field_width: usize,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    #[arg(long, default_value = "cardview.log")]
    log_file: PathBuf,

    /// Print the card state as json and exit
    #[arg(long)]
    export: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args.log_file) {
        eprintln!("Can not write log file {:?}: {}", args.log_file, e);
    }

    let result = if args.export { export(&args) } else { run(&args) };
    match result {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(path: &PathBuf) -> Result<(), CardError> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn config(args: &Args) -> CardConfig {
    CardConfig::default()
        .navigation(args.navigation)
        .max_field_width(args.max_field_width)
        .event_poll_time(args.poll_ms)
}

fn data_path(args: &Args) -> Result<PathBuf, CardError> {
    let expanded = shellexpand::full(&args.path)
        .map_err(|e| CardError::InvalidInput(format!("{}: {}", args.path, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn export(args: &Args) -> Result<(), CardError> {
    let table = Table::load(data_path(args)?)?;
    let sheet = Sheet::from_table(table, &config(args))?;
    println!("{}", sheet.cards().to_json()?);
    Ok(())
}

fn run(args: &Args) -> Result<(), CardError> {
    let cfg = config(args);
    let path = data_path(args)?;
    info!("Starting cardview for {:?} with {:?}", path, cfg);

    let mut terminal = ratatui::init();
    let result = run_loop(&cfg, path, &mut terminal);
    ratatui::restore();
    result
}

fn run_loop(
    cfg: &CardConfig,
    path: PathBuf,
    terminal: &mut ratatui::DefaultTerminal,
) -> Result<(), CardError> {
    let size = terminal.size()?;
    let mut model = Model::init(cfg, size.width as usize, size.height as usize)?;
    model.load_data_file(path)?;

    let ui = TableUI::new(cfg);
    let controller = Controller::new(cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }
    Ok(())
}
