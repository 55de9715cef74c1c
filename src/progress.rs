use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Terminal spinner shown while waiting on the model. Draws to stderr and
/// stays invisible when stderr is not a terminal.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// A spinner that never draws, for scripted runs and tests.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn stop(self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// User-facing status output for command handlers.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    visible: bool,
}

impl Console {
    pub fn new() -> Self {
        Self { visible: true }
    }

    /// Prints nothing and never spins.
    pub fn quiet() -> Self {
        Self { visible: false }
    }

    pub fn spinner(&self, message: &str) -> Spinner {
        if self.visible {
            Spinner::start(message)
        } else {
            Spinner::hidden()
        }
    }

    /// Bold green status line on stdout.
    pub fn status(&self, message: &str) {
        if self.visible {
            println!("{}", message.green().bold());
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
