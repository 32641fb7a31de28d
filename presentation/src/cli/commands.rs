//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Model backend selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmChoice {
    /// Keyword rules, no model required
    Simulated,
    /// llama.cpp-style local completion server
    Local,
    /// OpenAI-compatible chat completions API
    Api,
}

impl LlmChoice {
    /// Name understood by the `llm.backend` config key
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmChoice::Simulated => "simulated",
            LlmChoice::Local => "local",
            LlmChoice::Api => "api",
        }
    }
}

/// CLI arguments for tsagent
#[derive(Parser, Debug)]
#[command(name = "tsagent")]
#[command(author, version, about = "Conversational agent for tabular and time-series data")]
#[command(long_about = r#"
tsagent lets a language model drive a small set of data tools
(load, describe, plot, detect anomalies, save) through a chat.

Each turn the model answers with a Thought and an optional
`Action: tool(arg=literal, ...)` line, which is parsed (never evaluated)
and executed against the loaded tables.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./tsagent.toml      Project-level config
3. ~/.config/tsagent/config.toml   Global config

Example:
  tsagent summarize --data-dir ./data
  tsagent chat --data-dir ./data --llm api --api-model gpt-4o-mini
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the summary of the data files under a directory
    Summarize {
        /// Directory to scan (defaults to data.root)
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,

        /// Maximum files listed per directory
        #[arg(long, value_name = "N")]
        max_files: Option<usize>,
    },

    /// Start an interactive analysis session
    Chat(ChatArgs),
}

/// Options of the `chat` subcommand; each overrides the matching config key
#[derive(clap::Args, Debug, Default)]
pub struct ChatArgs {
    /// Directory holding the data files (defaults to data.root)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Model backend
    #[arg(long, value_enum)]
    pub llm: Option<LlmChoice>,

    /// Model name for the selected backend
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of the local completion server
    #[arg(long, value_name = "URL")]
    pub local_url: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// API key (prefer the environment variable)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Model requested from the API
    #[arg(long, value_name = "MODEL")]
    pub api_model: Option<String>,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}
