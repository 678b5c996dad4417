//! UI capability abstraction for decoupling the core from any presentation.
//!
//! The core only ever talks to its UI collaborator through [`CoreUi`].
//! Implementations are responsible for marshaling calls onto their own
//! presentation thread.

use std::sync::Arc;

use crate::utils::error::AppError;

/// Everything the core needs from the surrounding UI.
///
/// Progress and error sinks may be called from any worker thread.
pub trait CoreUi: Send + Sync {
    /// Show a modal progress indicator with the given message.
    fn show_progress_dialog(&self, message: &str);

    /// Update the progress indicator.
    ///
    /// # Arguments
    /// * `fraction` - Completed fraction in `0.0..=1.0`
    /// * `label` - Short description of the last processed item
    fn set_progress(&self, fraction: f64, label: &str);

    /// Hide the progress indicator.
    fn hide_progress_dialog(&self);

    /// Surface an error to the user.
    fn show_error_dialog(&self, error: &AppError);

    /// Reload every bin view.
    fn reload_all(&self);

    /// Reload a single bin view.
    fn reload_bin(&self, bin_id: i64);

    /// Move keyboard focus to the thumbnails of a bin.
    fn focus_thumbnails(&self, bin_id: i64);

    /// Number of sorting bins currently displayed (bin 0 excluded).
    fn bin_count(&self) -> i64;
}

/// Shared reference to a CoreUi implementation.
pub type SharedCoreUi = Arc<dyn CoreUi>;

/// UI collaborator that ignores every call, for headless use and tests.
#[derive(Debug, Clone)]
pub struct NoOpUi {
    bin_count: i64,
}

impl NoOpUi {
    pub fn new(bin_count: i64) -> Self {
        Self { bin_count }
    }
}

impl Default for NoOpUi {
    fn default() -> Self {
        Self::new(crate::models::settings::DEFAULT_BIN_COUNT)
    }
}

impl CoreUi for NoOpUi {
    fn show_progress_dialog(&self, _message: &str) {}
    fn set_progress(&self, _fraction: f64, _label: &str) {}
    fn hide_progress_dialog(&self) {}
    fn show_error_dialog(&self, _error: &AppError) {}
    fn reload_all(&self) {}
    fn reload_bin(&self, _bin_id: i64) {}
    fn focus_thumbnails(&self, _bin_id: i64) {}

    fn bin_count(&self) -> i64 {
        self.bin_count
    }
}

/// UI collaborator that turns every call into a debug log event.
#[derive(Debug, Clone)]
pub struct LoggingUi {
    bin_count: i64,
}

impl LoggingUi {
    pub fn new(bin_count: i64) -> Self {
        Self { bin_count }
    }
}

impl Default for LoggingUi {
    fn default() -> Self {
        Self::new(crate::models::settings::DEFAULT_BIN_COUNT)
    }
}

impl CoreUi for LoggingUi {
    fn show_progress_dialog(&self, message: &str) {
        tracing::debug!(message, "Progress dialog shown");
    }

    fn set_progress(&self, fraction: f64, label: &str) {
        tracing::debug!(fraction, label, "Progress");
    }

    fn hide_progress_dialog(&self) {
        tracing::debug!("Progress dialog hidden");
    }

    fn show_error_dialog(&self, error: &AppError) {
        tracing::debug!(code = error.code(), error = %error, "Error dialog shown");
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
