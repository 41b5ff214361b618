//! Client-side chat session controller for a simulated-interview training
//! backend, plus the terminal front end that drives it.
//!
//! The heart of the crate is [`controller::ChatSessionController`]: it owns
//! one session's identity, persona choice, draft and transcript, and talks to
//! the backend through the [`backend::ChatBackend`] trait.

pub mod backend;
pub mod cli;
pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod logs;
pub mod protocol;
pub mod session;
pub mod terminal;
pub mod transcript;

pub use backend::{ChatBackend, HttpBackend};
pub use config::ClientConfig;
pub use controller::{ChatSessionController, PendingSend, RequestState, SendOutcome, SendStatus};
pub use directory::{PersonaDirectory, PersonaSet};
pub use error::{ChatError, DirectoryError, NameError, PersonaError, SendFailure, SendRejected};
pub use transcript::{Message, ScrollAnchor, Sender, Transcript};
