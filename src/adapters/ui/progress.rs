//! Spinner shown while a recompute runs.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Starts a ticking spinner with `message`. Call `finish_with_message` when done.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
