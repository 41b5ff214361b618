//! Error types for the chat client.
//!
//! Each concern has its own enum so callers can match on exactly the
//! failures that concern can produce. [`ChatError`] folds them together for
//! the binary, where everything ends up as a single `Result`.

use std::path::PathBuf;

use thiserror::Error;

/// Why the persona directory could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The backend could not be reached at all.
    #[error("persona directory unreachable: {detail}")]
    Network { detail: String },
    /// The backend replied with a non-2xx status.
    #[error("persona directory returned HTTP {status}")]
    Http { status: u16 },
    /// The body was not the expected JSON shape.
    #[error("persona directory sent an unreadable response: {detail}")]
    Malformed { detail: String },
}

/// Why a chat round trip failed after it was dispatched.
///
/// The `Display` text is what ends up in the transcript as a system message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendFailure {
    #[error("Backend not responding: {detail}")]
    Network { detail: String },
    #[error("Backend returned HTTP {}{}", .status, format_detail(.detail))]
    Http { status: u16, detail: Option<String> },
    /// A 2xx body that carried an `error` or `detail` field.
    #[error("Backend reported an error: {detail}")]
    Backend { detail: String },
    #[error("Backend sent a malformed reply: {detail}")]
    Malformed { detail: String },
}

fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(": {d}"),
        _ => String::new(),
    }
}

/// A send that was refused before anything was appended or dispatched.
///
/// Not an error from the user's point of view: a well-behaved view disables
/// the send affordance in all of these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("student name has not been confirmed")]
    NameNotConfirmed,
    #[error("no persona selected")]
    NoPersona,
    #[error("message is empty")]
    EmptyDraft,
    #[error("a reply is still pending")]
    RequestPending,
    /// A reply arrived while no request was outstanding.
    #[error("no request is pending")]
    NotPending,
}

/// Name-entry validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Please enter your name.")]
    Empty,
    #[error("name already confirmed as '{current}'")]
    AlreadyConfirmed { current: String },
}

/// Persona selection failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersonaError {
    #[error("personas are still loading")]
    DirectoryLoading,
    #[error("persona directory is unavailable")]
    DirectoryUnavailable,
    #[error("unknown persona '{persona}'")]
    Unknown { persona: String },
}

/// Log export failures.
#[derive(Debug, Error)]
pub enum LogDownloadError {
    #[error("no secret key given")]
    MissingSecret,
    #[error("log download failed: {detail}")]
    Network { detail: String },
    #[error("log download returned HTTP {status}")]
    Http { status: u16 },
    #[error("could not write logs to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no backend URL configured; pass --api-url or set INTERVIEW_CHAT_API_URL")]
    MissingApiUrl,
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Crate-level error used by the binary.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    LogDownload(#[from] LogDownloadError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
