//! REPL (Read-Eval-Print Loop) for interactive analysis

use crate::ConsoleFormatter;
use crate::{ProgressReporter, SimpleProgress};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use tracing::warn;
use tsagent_application::ConversationSession;

/// Entries kept in the line-editor history file unless overridden
const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// What the REPL should do after a line of input
#[derive(Debug, PartialEq, Eq)]
enum CommandResult {
    Continue,
    Exit,
}

/// Interactive chat REPL around one conversation session
pub struct ChatRepl {
    session: ConversationSession,
    show_progress: bool,
    prompt: String,
    history_file: Option<PathBuf>,
    history_capacity: usize,
}

impl ChatRepl {
    pub fn new(session: ConversationSession) -> Self {
        Self {
            session,
            show_progress: true,
            prompt: "tsagent".to_string(),
            history_file: default_history_file(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Set whether to show a spinner while waiting
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Label shown before each input line
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Override where line-editor history is kept
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_file = path;
        }
        self
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Run the interactive REPL until the user exits
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut editor = Reedline::create();
        if let Some(path) = &self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(self.history_capacity, path.clone()) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!("History disabled ({}): {}", path.display(), e),
            }
        }

        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(self.prompt.clone()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    if self.handle_line(line.trim()).await == CommandResult::Exit {
                        break;
                    }
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> CommandResult {
        if line.is_empty() {
            return CommandResult::Continue;
        }
        if is_exit_command(line) {
            println!("Bye!");
            return CommandResult::Exit;
        }
        if line.starts_with('/') {
            self.handle_command(line);
            return CommandResult::Continue;
        }
        self.process_input(line).await;
        CommandResult::Continue
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│        tsagent - Time-Series Analysis       │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Ask for analysis in plain language, e.g. \"load the data\",");
        println!("\"describe it\", \"plot value over time\", \"find anomalies\".");
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /history          - Show transcript size and last artifact");
        println!("  /quit, /exit, /q  - Exit (also: exit, quit)");
        println!();
    }

    fn handle_command(&self, cmd: &str) {
        match cmd {
            "/help" | "/h" | "/?" => {
                println!();
                Self::print_help();
            }
            "/history" => {
                println!();
                println!(
                    "{}",
                    ConsoleFormatter::format_history_stats(
                        self.session.history(),
                        self.session.last_artifact().map(|a| a.as_str()),
                    )
                );
                println!("Turns: {}", self.session.turn_count());
                println!();
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
    }

    async fn process_input(&mut self, input: &str) {
        println!();

        let outcome = if self.show_progress {
            let progress = ProgressReporter::new();
            self.session.chat_turn(input, &progress).await
        } else {
            self.session.chat_turn(input, &SimpleProgress).await
        };

        println!("{}", ConsoleFormatter::format_outcome(&outcome));
    }
}

fn default_history_file() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tsagent").join("history.txt"))
}

/// Words that end the session, with or without a leading slash
fn is_exit_command(line: &str) -> bool {
    matches!(
        line.to_lowercase().as_str(),
        "exit" | "quit" | "/exit" | "/quit" | "/q"
    )
}
