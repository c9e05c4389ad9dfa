//! Progress indicator utilities

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for work of unknown length
///
/// The spinner is hidden when `quiet` is set so scripted runs stay clean.
pub fn create_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
