use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::playback::LoadingIndicator;

/// Terminal spinner standing in for the page's loading overlay.
pub struct SpinnerIndicator {
    message: String,
    spinner: Option<ProgressBar>,
}

impl SpinnerIndicator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            spinner: None,
        }
    }

    #[allow(dead_code)]
    pub fn is_visible(&self) -> bool {
        self.spinner.is_some()
    }
}

impl LoadingIndicator for SpinnerIndicator {
    fn show(&mut self) {
        if self.spinner.is_some() {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
            spinner.set_style(style);
        }
        spinner.set_message(self.message.clone());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn hide(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for SpinnerIndicator {
    fn drop(&mut self) {
        self.hide();
    }
}
