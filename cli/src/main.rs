//! CLI entrypoint for tsagent
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tsagent_application::ConversationSession;
use tsagent_infrastructure::{
    ConfigLoader, DataToolExecutor, FileConfig, JsonlConversationLogger, create_backend,
    summarize_directory,
};
use tsagent_presentation::{ChatArgs, ChatRepl, Cli, Command, ConsoleFormatter, LlmChoice};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        let config = if cli.no_config {
            ConfigLoader::load_defaults()
        } else {
            load_config(cli.config.as_ref())?
        };
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        load_config(cli.config.as_ref())?
    };

    let command = cli.command.unwrap_or(Command::Chat(ChatArgs::default()));
    match &command {
        Command::Summarize {
            data_dir,
            max_files,
        } => {
            if let Some(dir) = data_dir {
                config.data.root = dir.clone();
            }
            if let Some(n) = max_files {
                config.data.max_files_per_folder = *n;
            }
        }
        Command::Chat(args) => apply_chat_overrides(&mut config, args),
    }

    let _log_guard = init_logging(cli.verbose, config.logging.log_dir.as_deref());
    info!("Starting tsagent");

    config.validate().context("Invalid configuration")?;

    match command {
        Command::Summarize { .. } => run_summarize(&config).await,
        Command::Chat(args) => run_chat(&config, args.quiet).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<FileConfig> {
    ConfigLoader::load(path).map_err(|e| anyhow!("Failed to load configuration: {}", e))
}

/// Install the console subscriber, plus a daily-rotated file layer when
/// `log_dir` is set. The returned guard flushes the file on drop.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tsagent.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(level)),
        )
        .with(file_layer)
        .init();

    guard
}

/// Command-line flags win over every configuration source
fn apply_chat_overrides(config: &mut FileConfig, args: &ChatArgs) {
    if let Some(dir) = &args.data_dir {
        config.data.root = dir.clone();
    }
    if let Some(llm) = args.llm {
        config.llm.backend = llm.as_str().to_string();
    }
    if let Some(model) = &args.model {
        if config.llm.backend == LlmChoice::Local.as_str() {
            config.llm.local_model = model.clone();
        } else {
            config.llm.api_model = model.clone();
        }
    }
    if let Some(url) = &args.local_url {
        config.llm.local_url = url.clone();
    }
    if let Some(url) = &args.api_url {
        config.llm.api_base_url = url.clone();
    }
    if let Some(key) = &args.api_key {
        config.llm.api_key = Some(key.clone());
    }
    if let Some(model) = &args.api_model {
        config.llm.api_model = model.clone();
    }
}

async fn run_summarize(config: &FileConfig) -> Result<()> {
    let summary = summarize_directory(
        &config.data.root,
        config.data.max_files_per_folder,
        config.data.max_preview_rows,
    )
    .await;
    println!(
        "{}",
        ConsoleFormatter::format_summary(&config.data.root.display().to_string(), &summary)
    );
    Ok(())
}

async fn run_chat(config: &FileConfig, quiet: bool) -> Result<()> {
    let data_root = &config.data.root;
    if !data_root.is_dir() {
        warn!("Data directory {} does not exist", data_root.display());
    }

    let summary = summarize_directory(
        data_root,
        config.data.max_files_per_folder,
        config.data.max_preview_rows,
    )
    .await;

    // === Dependency Injection ===
    let backend_kind = config.backend_kind()?;
    let backend = create_backend(backend_kind, &config.llm, data_root)
        .context("Failed to create model backend")?;
    let executor = Arc::new(
        DataToolExecutor::new(data_root.clone(), config.tools.output_dir.clone())
            .with_capacity(config.tools.max_artifacts),
    );

    info!(backend = %backend_kind, data_root = %data_root.display(), "Session ready");

    let mut session = ConversationSession::new(backend, executor, summary)
        .with_params(config.llm.generation_params());
    if let Some(path) = &config.logging.conversation_log
        && let Some(logger) = JsonlConversationLogger::new(path)
    {
        info!(path = %path.display(), "Conversation log enabled");
        session = session.with_conversation_logger(Arc::new(logger));
    }

    let mut repl = ChatRepl::new(session)
        .with_progress(config.repl.show_progress && !quiet)
        .with_prompt(config.repl.prompt.as_str())
        .with_history_capacity(config.repl.history_capacity)
        .with_history_file(config.repl.resolve_history_file());
    repl.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_overrides() {
        let mut config = FileConfig::default();
        let args = ChatArgs {
            data_dir: Some(PathBuf::from("data")),
            llm: Some(LlmChoice::Local),
            model: Some("qwen2".to_string()),
            local_url: Some("http://localhost:9000".to_string()),
            ..Default::default()
        };

        apply_chat_overrides(&mut config, &args);

        assert_eq!(config.data.root, PathBuf::from("data"));
        assert_eq!(config.llm.backend, "local");
        assert_eq!(config.llm.local_model, "qwen2");
        assert_eq!(config.llm.local_url, "http://localhost:9000");
        assert_eq!(config.llm.api_model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_model_override_targets_api_by_default() {
        let mut config = FileConfig::default();
        config.llm.backend = "api".to_string();
        let args = ChatArgs {
            model: Some("gpt-4o-mini".to_string()),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };

        apply_chat_overrides(&mut config, &args);

        assert_eq!(config.llm.api_model, "gpt-4o-mini");
        assert_eq!(config.llm.resolve_api_key().as_deref(), Some("sk-test"));
        assert!(config.validate().is_ok());
    }
}
