//! Console output formatter for conversation turns

use colored::Colorize;
use tsagent_domain::{History, Role, TurnOutcome};

/// Formats turn outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format one turn as `[Thought]`, `[Action]`, `[Tool Result]` and
    /// `[Error]` sections; empty sections are left out.
    pub fn format_outcome(outcome: &TurnOutcome) -> String {
        let mut output = String::new();

        if !outcome.model_text.trim().is_empty() {
            output.push_str(&Self::section("[Thought]".cyan().bold().to_string()));
            output.push_str(&Self::indent(outcome.model_text.trim(), "  "));
            output.push('\n');
        }

        if let Some(action) = &outcome.action {
            output.push_str(&Self::section("[Action]".yellow().bold().to_string()));
            output.push_str(&Self::indent(&action.to_string(), "  "));
            output.push('\n');
        }

        if let Some(result) = &outcome.tool_result {
            output.push_str(&Self::section("[Tool Result]".green().bold().to_string()));
            output.push_str(&Self::indent(result, "  "));
            output.push('\n');
        }

        if let Some(error) = &outcome.error {
            output.push_str(&Self::section("[Error]".red().bold().to_string()));
            output.push_str(&Self::indent(&error.to_string(), "  "));
            output.push('\n');
        }

        output
    }

    /// One-line overview of a transcript
    pub fn format_history_stats(history: &History, last_artifact: Option<&str>) -> String {
        format!(
            "{} {} messages ({} user, {} assistant)\n{} {}",
            "History:".cyan().bold(),
            history.len(),
            history.count_role(Role::User),
            history.count_role(Role::Assistant),
            "Last artifact:".cyan().bold(),
            last_artifact.unwrap_or("(none)")
        )
    }

    /// Banner printed above a directory summary
    pub fn format_summary(root: &str, summary: &str) -> String {
        if summary.is_empty() {
            return format!("{} no csv files under {}", "Summary:".yellow().bold(), root);
        }
        format!("{}\n{}", Self::header(&format!("Data under {}", root)), summary)
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section(title: String) -> String {
        format!("{}\n", title)
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
