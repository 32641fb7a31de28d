//! Progress reporting for conversation turns

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use tsagent_application::TurnProgressNotifier;
use tsagent_domain::Action;

/// Reports turn progress with a spinner
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start(&self, prefix: &str, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(prefix.to_string());
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.spinner.lock()
            && let Some(previous) = slot.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn finish(&self, message: String) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_with_message(message);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnProgressNotifier for ProgressReporter {
    fn on_model_start(&self, backend: &str) {
        self.start("Model", format!("waiting for {}...", backend));
    }

    fn on_model_end(&self, success: bool) {
        if success {
            self.finish(format!("{}", "replied".green()));
        } else {
            self.finish(format!("{}", "failed".red()));
        }
    }

    fn on_tool_start(&self, action: &Action) {
        self.start("Tool", format!("running {}...", action.name));
    }

    fn on_tool_end(&self, tool: &str, success: bool) {
        if success {
            self.finish(format!("{} {}", "v".green(), tool));
        } else {
            self.finish(format!("{} {}", "x".red(), tool));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl TurnProgressNotifier for SimpleProgress {
    fn on_model_start(&self, backend: &str) {
        println!("{} asking {}", "->".cyan(), backend.bold());
    }

    fn on_model_end(&self, success: bool) {
        if !success {
            println!("  {} model call failed", "x".red());
        }
    }

    fn on_tool_start(&self, action: &Action) {
        println!("{} {}", "->".cyan(), action.name.bold());
    }

    fn on_tool_end(&self, tool: &str, success: bool) {
        if success {
            println!("  {} {}", "v".green(), tool);
        } else {
            println!("  {} {} (failed)", "x".red(), tool);
        }
    }
}
