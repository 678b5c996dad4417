//! Command line interface
//!
//! Every dataset subcommand loads the dataset first, which is cheap once
//! its store holds the artifacts.

pub mod dataset;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use picsort_core::{BinController, ALL_BINS};

#[derive(Debug, Parser)]
#[command(name = "picsort", version, about = "Sort image datasets into numbered bins")]
pub struct Cli {
    /// Settings file (default: <config dir>/picsort/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of sorting bins, overriding the settings file
    #[arg(long, global = true)]
    pub bins: Option<i64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a dataset and build its thumbnail cache
    Load { dir: PathBuf },

    /// List images in a bin (-1 lists every image)
    List {
        dir: PathBuf,
        #[arg(long, default_value_t = ALL_BINS, allow_negative_numbers = true)]
        bin: i64,
    },

    /// Move images from one bin to another
    Move {
        dir: PathBuf,
        #[arg(long)]
        from: i64,
        #[arg(long)]
        to: i64,
        /// Image paths, relative to the dataset root or absolute
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Add images to a bin, keeping their current bins
    Tag {
        dir: PathBuf,
        #[arg(long)]
        to: i64,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Copy every bin into a directory tree under DEST
    Export { dir: PathBuf, dest: PathBuf },

    /// Show store statistics
    Stats { dir: PathBuf },

    /// Print the effective settings
    Settings {
        /// Overwrite the settings file with defaults first
        #[arg(long)]
        reset: bool,
    },
}

/// Run a dataset subcommand against `controller`, writing results to `out`
pub fn execute(
    command: &Command,
    controller: &mut BinController,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Load { dir } => dataset::load(controller, dir, out),
        Command::List { dir, bin } => dataset::list(controller, dir, *bin, out),
        Command::Move {
            dir,
            from,
            to,
            files,
        } => dataset::move_files(controller, dir, *from, *to, files, out),
        Command::Tag { dir, to, files } => dataset::tag(controller, dir, *to, files, out),
        Command::Export { dir, dest } => dataset::export(controller, dir, dest, out),
        Command::Stats { dir } => dataset::stats(controller, dir, out),
        Command::Settings { .. } => {
            anyhow::bail!("settings is not a dataset command")
        }
    }
}
