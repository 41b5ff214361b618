use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::config::API_URL_ENV;

#[derive(Parser, Debug)]
#[command(name = "interview-chat")]
#[command(version)]
#[command(about = "Chat with a simulated-interview persona from the terminal")]
pub struct Args {
    /// Backend base URL (e.g. https://interview.example.edu)
    #[arg(long, global = true, env = API_URL_ENV)]
    pub api_url: Option<String>,

    /// TOML config file with api_url, timeouts and log_output
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Student name for the chat; prompted for when absent
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Persona to select once the directory has loaded
    #[arg(long, global = true)]
    pub persona: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Interactive chat session (the default)
    Chat,
    /// Print the personas the backend offers and exit
    Personas,
    /// Instructor: download the student logs
    DownloadLogs {
        /// Secret key expected by the backend
        #[arg(long, default_value = "")]
        secret: String,

        /// Output path (defaults to log_output from config, then student_logs.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Args {
    /// The subcommand to run, defaulting to an interactive chat.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

/// `tracing` filter directive for a `-v` count.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
