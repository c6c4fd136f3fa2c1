use std::env;

use color_eyre::owo_colors::OwoColorize;
use guessreq_core::CommandStatus;

/// Colors for the run summary; everything is plain when color is off.
pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(force_no_color: bool, is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !(force_no_color || env_no_color) && is_tty,
        }
    }

    pub fn status(&self, status: CommandStatus, text: &str) -> String {
        match status {
            CommandStatus::Ok => self.paint(&format!("✔ {text}"), |s| s.green().bold().to_string()),
            CommandStatus::UserError => {
                self.paint(&format!("✗ {text}"), |s| s.yellow().bold().to_string())
            }
            CommandStatus::Failure => {
                self.paint(&format!("✖ {text}"), |s| s.red().bold().to_string())
            }
        }
    }

    /// Hints and file locations printed after the summary.
    pub fn note(&self, text: &str) -> String {
        self.paint(text, |s| s.cyan().to_string())
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, |s| s.bold().to_string())
    }

    /// One row of the package table, colored by its `status` column.
    pub fn package_row(&self, status: &str, row: &str) -> String {
        match status {
            "resolved" => self.paint(row, |s| s.green().to_string()),
            "skipped" => self.paint(row, |s| s.yellow().to_string()),
            _ => row.to_string(),
        }
    }

    fn paint(&self, text: &str, color: impl FnOnce(&str) -> String) -> String {
        if self.enabled {
            color(text)
        } else {
            text.to_string()
        }
    }
}
