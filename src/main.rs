use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use colored::*;
use tracing_subscriber::EnvFilter;

use interview_chat::backend::{ChatBackend, HttpBackend};
use interview_chat::cli::{log_level, Args, Command};
use interview_chat::config::{ClientConfig, ConfigFile};
use interview_chat::controller::ChatSessionController;
use interview_chat::error::ChatError;
use interview_chat::logs::{status_message, LogExporter};
use interview_chat::terminal;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".bright_red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so the chat on stdout stays readable.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(args: Args) -> Result<(), ChatError> {
    let command = args.resolved_command();

    if let Command::Completions { shell } = command {
        clap_complete::generate(shell, &mut Args::command(), "interview-chat", &mut std::io::stdout());
        return Ok(());
    }

    let file = args.config.as_deref().map(ConfigFile::load).transpose()?;
    let config = ClientConfig::resolve(args.api_url.as_deref(), file)?;
    tracing::info!(base_url = %config.base_url, "backend configured");
    let backend = HttpBackend::new(config);

    match command {
        Command::Chat => {
            let mut controller = ChatSessionController::new(backend);
            terminal::run_chat(&mut controller, args.name, args.persona).await
        }
        Command::Personas => {
            let set = backend.fetch_personas().await?;
            if set.is_empty() {
                println!("The backend has no personas available.");
            }
            for name in set.iter() {
                println!("{name}");
            }
            Ok(())
        }
        Command::DownloadLogs { secret, output } => {
            let path = output.unwrap_or_else(|| backend.config().log_output.clone());
            let result = LogExporter::new(&backend).export(&secret, &path).await;
            println!("{}", status_message(&result));
            if result.is_ok() {
                println!("Saved to {}", path.display());
            }
            result.map(|_| ()).map_err(ChatError::from)
        }
        Command::Completions { .. } => Ok(()),
    }
}
