//! PicSort - sort image datasets into numbered bins
//!
//! Headless front end for picsort-core: wires logging and settings, and
//! drives the bin controller from the command line.

pub mod adapters;
pub mod commands;
pub mod logging;

use std::sync::Arc;

use clap::Parser;

use picsort_core::{AppDirs, BinController, SettingsStore};

use adapters::ConsoleUi;
use commands::{Cli, Command};

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::locate()?;
    let _guard = logging::init_logging(&dirs.log_dir())?;

    tracing::info!("PicSort starting");

    let store = SettingsStore::open(cli.config.clone().unwrap_or_else(|| dirs.settings_file()));

    if let Command::Settings { reset } = &cli.command {
        let settings = if *reset { store.reset()? } else { store.load()? };
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let mut settings = store.load()?;
    if let Some(bins) = cli.bins {
        settings.bins.count = bins;
    }

    let ui = Arc::new(ConsoleUi::new(settings.bins.effective_count()));
    let mut controller = BinController::new(ui, settings);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(&cli.command, &mut controller, &mut out)
}
