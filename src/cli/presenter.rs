//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (the actual result output)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Output text to stdout without newline
    pub fn output_inline(&self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Format recording progress bar
    pub fn format_recording_progress(&self, elapsed_ms: u64, max_ms: u64) -> String {
        let elapsed_secs = elapsed_ms / 1000;
        let max_secs = max_ms / 1000;
        let percent = if max_ms > 0 {
            (elapsed_ms as f64 / max_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        let bar_width = 20;
        let filled = ((percent / 100.0) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {:>3}s / {}s",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            elapsed_secs,
            max_secs
        )
    }

    /// Format generation progress bar from a 0..=100 estimate
    pub fn format_generation_progress(&self, percent: u8) -> String {
        let percent = percent.min(100);
        let bar_width = 20;
        let filled = (percent as usize * bar_width) / 100;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {:>3}%",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            percent
        )
    }

    /// Update the spinner with recording progress
    pub fn update_recording_progress(&self, elapsed_ms: u64, max_ms: u64) {
        let progress = self.format_recording_progress(elapsed_ms, max_ms);
        self.update_spinner(&format!("Recording... {} (press Enter to stop)", progress));
    }

    /// Update the spinner with generation progress
    pub fn update_generation_progress(&self, percent: u8) {
        let progress = self.format_generation_progress(percent);
        self.update_spinner(&format!("Generating... {}", progress));
    }

    /// Print a key-value pair (for config list and catalogs)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_progress_at_start() {
        let presenter = Presenter::new();
        let progress = presenter.format_recording_progress(0, 10000);
        assert!(progress.contains("0s / 10s"));
    }

    #[test]
    fn recording_progress_at_half() {
        let presenter = Presenter::new();
        let progress = presenter.format_recording_progress(5000, 10000);
        assert!(progress.contains("5s / 10s"));
    }

    #[test]
    fn recording_progress_at_end() {
        let presenter = Presenter::new();
        let progress = presenter.format_recording_progress(10000, 10000);
        assert!(progress.contains("10s / 10s"));
    }

    #[test]
    fn generation_progress_formats_percent() {
        let presenter = Presenter::new();
        assert!(presenter.format_generation_progress(0).contains("0%"));
        assert!(presenter.format_generation_progress(50).contains("50%"));
        assert!(presenter.format_generation_progress(100).contains("100%"));
    }

    #[test]
    fn generation_progress_clamps_over_100() {
        let presenter = Presenter::new();
        assert!(presenter.format_generation_progress(200).contains("100%"));
    }
}
