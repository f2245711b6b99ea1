//! `dodo` - inbox triage from the command line.
//!
//! Wires the JSON-file adapters and the HTTP completion service to
//! `dodo-core` and exposes one subcommand per core operation.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use dodo_core::domain::{RowRef, Stage};
use dodo_core::impls::{
    FileMailbox, FileProperties, FileTaskBoard, GeminiConfig, GeminiService,
    ScriptedCompletionService,
};
use dodo_core::ports::CompletionService;
use dodo_core::{Advanced, Dodo, DodoBuilder, DodoError, Settings};

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "dodo", about = "Turn inbox messages into tracked tasks", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "dodo.toml")]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Triage the recent inbox once and print the run report.
    Triage {
        /// Answer every prompt with "no label, no actions" instead of calling the service.
        #[arg(long)]
        offline: bool,
    },

    /// Move one task to its next stage.
    Advance {
        /// Current stage: pending, in-progress or done (aliases: do, doing).
        stage: String,

        /// 0-based row within the stage, as shown by `dodo board`.
        row: usize,
    },

    /// Print stage counts and contents.
    Board,

    /// Triage every `hours_between_checks` hours until Ctrl-C.
    Watch {
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Serialize)]
struct AdvanceOutput {
    from: Stage,
    row: RowRef,
    #[serde(flatten)]
    result: Advanced,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "dodo failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> CliResult<()> {
    let settings = Settings::load_from_path(&args.config)?;

    match args.command {
        Command::Triage { offline } => {
            let dodo = build(settings, offline)?;
            let report = dodo.run_triage().await?;
            print_json(&report)?;
        }
        Command::Advance { stage, row } => {
            let dodo = build(settings, true)?;
            let from: Stage = stage.parse()?;
            let row = RowRef::new(row);
            let result = dodo.advance_task(from, row).await?;
            print_json(&AdvanceOutput { from, row, result })?;
        }
        Command::Board => {
            let dodo = build(settings, true)?;
            print_json(&dodo.board().await?)?;
        }
        Command::Watch { offline } => {
            let dodo = build(settings, offline)?;
            watch(&dodo).await?;
        }
    }
    Ok(())
}

/// Runs are awaited inside the loop, so they never overlap; ticks missed
/// during a long run are skipped, not replayed.
async fn watch(dodo: &Dodo) -> CliResult<()> {
    let hours = dodo.settings().hours_between_checks;
    let mut ticker = tokio::time::interval(Duration::from_secs(hours * 3600));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(hours, "watching inbox");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = dodo.run_triage().await?;
                print_json(&report)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                return Ok(());
            }
        }
    }
}

/// `offline` swaps the HTTP service for a scripted one. Commands that never
/// prompt the model build offline so they work without an API key.
fn build(settings: Settings, offline: bool) -> Result<Dodo, DodoError> {
    let completion: Arc<dyn CompletionService> = if offline {
        Arc::new(ScriptedCompletionService::offline())
    } else {
        let service = GeminiService::new(GeminiConfig {
            endpoint: settings.completion.endpoint.clone(),
            api_key: settings.api_key()?,
            request_timeout: Duration::from_secs(settings.completion.request_timeout_secs),
        })
        .map_err(|err| DodoError::Config(format!("failed to build HTTP client: {err}")))?;
        Arc::new(service)
    };

    let storage = settings.storage.clone();
    let dodo = DodoBuilder::new(settings)
        .message_store(Arc::new(FileMailbox::with_link_template(
            storage.mailbox,
            storage.link_template,
        )))
        .task_store(Arc::new(FileTaskBoard::new(storage.board)))
        .property_store(Arc::new(FileProperties::new(storage.properties)))
        .completion_service(completion)
        .build()?;
    Ok(dodo)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> CliResult<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber.try_init()?,
        LogFormat::Json => subscriber.json().try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_advance_with_alias() {
        let cli = Cli::try_parse_from(["dodo", "--config", "x.toml", "advance", "doing", "2"]).unwrap();
        match cli.command {
            Command::Advance { stage, row } => {
                assert_eq!(stage.parse::<Stage>().unwrap(), Stage::InProgress);
                assert_eq!(row, 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_json_log_format() {
        let cli = Cli::try_parse_from(["dodo", "--log-format", "json", "triage", "--offline"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Triage { offline: true }));
    }

    #[test]
    fn advance_output_is_flat() {
        let out = AdvanceOutput {
            from: Stage::Pending,
            row: RowRef::new(0),
            result: Advanced::Moved {
                to: Stage::InProgress,
                row: RowRef::new(3),
            },
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["from"], "pending");
        assert_eq!(v["result"], "moved");
        assert_eq!(v["to"], "in-progress");
    }
}
