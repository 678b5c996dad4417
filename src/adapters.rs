//! Console adapters for picsort-core traits
//!
//! Implements the core's UI capability on a terminal: progress goes to an
//! `indicatif` bar on stderr, errors are printed, refresh hints are logged.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use picsort_core::events::CoreUi;
use picsort_core::AppError;

/// Positions on the bar; fractions are scaled onto this
const PROGRESS_SCALE: u64 = 1000;

fn progress_style() -> ProgressStyle {
    match ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {percent:>3}% {msg}") {
        Ok(style) => style.progress_chars("##-"),
        Err(_) => ProgressStyle::default_bar(),
    }
}

/// Terminal implementation of [`CoreUi`]
pub struct ConsoleUi {
    bar: Mutex<Option<ProgressBar>>,
    bin_count: i64,
    visible: bool,
}

impl ConsoleUi {
    pub fn new(bin_count: i64) -> Self {
        Self {
            bar: Mutex::new(None),
            bin_count,
            visible: true,
        }
    }

    /// Same behavior without drawing anything
    pub fn hidden(bin_count: i64) -> Self {
        Self {
            visible: false,
            ..Self::new(bin_count)
        }
    }

    /// Position of the active bar, if one is shown
    pub fn position(&self) -> Option<u64> {
        self.bar
            .lock()
            .ok()
            .and_then(|bar| bar.as_ref().map(|b| b.position()))
    }
}

impl CoreUi for ConsoleUi {
    fn show_progress_dialog(&self, message: &str) {
        let target = if self.visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(PROGRESS_SCALE), target);
        bar.set_style(progress_style());
        bar.set_message(message.to_string());

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn set_progress(&self, fraction: f64, label: &str) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                let position = (fraction.clamp(0.0, 1.0) * PROGRESS_SCALE as f64).round() as u64;
                // workers finish out of order
                if position > bar.position() {
                    bar.set_position(position);
                }
                bar.set_message(label.to_string());
            }
        }
    }

    fn hide_progress_dialog(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }

    fn show_error_dialog(&self, error: &AppError) {
        if self.visible {
            eprintln!("error [{}]: {}", error.code(), error);
        }
    }

    fn reload_all(&self) {
        tracing::debug!("Reload all bins");
    }

    fn reload_bin(&self, bin_id: i64) {
        tracing::debug!(bin_id, "Reload bin");
    }

    fn focus_thumbnails(&self, bin_id: i64) {
        tracing::debug!(bin_id, "Focus thumbnails");
    }

    fn bin_count(&self) -> i64 {
        self.bin_count
    }
}
