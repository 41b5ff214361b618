//! Chat session controller.
//!
//! ## Design
//! - One controller per session; it owns the session identity, the persona
//!   directory state, the draft, the transcript and the in-flight flag.
//! - Network work happens in futures that own an `Arc` of the backend and
//!   never borrow the controller, so a view can poll the directory fetch and
//!   a chat send side by side while still handling input.
//! - Results come back through `apply_directory` / `complete_send`, which are
//!   the only places those containers are written.
//!
//! ## Send cycle
//! 1. `begin_send` checks the preconditions, appends the user's message,
//!    clears the draft and marks the request pending.
//! 2. The returned [`PendingSend`] is dispatched.
//! 3. `complete_send` appends the bot reply, or a system message describing
//!    the failure, and returns to idle.
//!
//! The user message from step 1 is never rolled back.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::ChatBackend;
use crate::directory::{PersonaDirectory, PersonaSet};
use crate::error::{DirectoryError, NameError, PersonaError, SendFailure, SendRejected};
use crate::protocol::ChatRequest;
use crate::session::Session;
use crate::transcript::{Message, Sender, Transcript};

/// Whether a chat request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Pending,
}

/// What happened to a call to [`ChatSessionController::send`] or
/// [`ChatSessionController::complete_send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    /// Preconditions failed; nothing changed.
    Rejected(SendRejected),
    /// A bot reply was appended.
    Replied,
    /// A system message describing the failure was appended.
    Failed(SendFailure),
}

/// An in-flight persona directory request.
pub struct DirectoryFetch<B> {
    backend: Arc<B>,
}

impl<B: ChatBackend> DirectoryFetch<B> {
    pub async fn run(self) -> Result<PersonaSet, DirectoryError> {
        self.backend.fetch_personas().await
    }
}

/// A chat request whose user message is already in the transcript.
pub struct PendingSend<B> {
    backend: Arc<B>,
    request: ChatRequest,
    seq: u64,
}

impl<B: ChatBackend> PendingSend<B> {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Perform the round trip. Always resolves; failures are carried in the
    /// outcome.
    pub async fn dispatch(self) -> SendOutcome {
        let result = self.backend.send_chat(&self.request).await;
        SendOutcome { seq: self.seq, result }
    }
}

/// Result of a dispatched [`PendingSend`], ready to be reconciled.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    seq: u64,
    result: Result<String, SendFailure>,
}

impl SendOutcome {
    pub fn result(&self) -> &Result<String, SendFailure> {
        &self.result
    }
}

/// State and behaviour of one chat session.
pub struct ChatSessionController<B> {
    backend: Arc<B>,
    session: Session,
    directory: PersonaDirectory,
    directory_requested: bool,
    draft: String,
    transcript: Transcript,
    in_flight: Option<u64>,
    next_seq: u64,
    last_failure: Option<SendFailure>,
    name_error: Option<NameError>,
}

impl<B: ChatBackend> ChatSessionController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_shared_backend(Arc::new(backend))
    }

    pub fn with_shared_backend(backend: Arc<B>) -> Self {
        let session = Session::new();
        debug!(session_id = %session.session_id(), "chat session created");
        Self {
            backend,
            session,
            directory: PersonaDirectory::Loading,
            directory_requested: false,
            draft: String::new(),
            transcript: Transcript::new(),
            in_flight: None,
            next_seq: 0,
            last_failure: None,
            name_error: None,
        }
    }

    // -----------------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------------

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn directory(&self) -> &PersonaDirectory {
        &self.directory
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn request_state(&self) -> RequestState {
        if self.in_flight.is_some() {
            RequestState::Pending
        } else {
            RequestState::Idle
        }
    }

    /// The failure from the most recent round trip, cleared by the next send.
    pub fn last_failure(&self) -> Option<&SendFailure> {
        self.last_failure.as_ref()
    }

    /// Validation message from the last refused name, if any.
    pub fn name_error(&self) -> Option<&NameError> {
        self.name_error.as_ref()
    }

    // -----------------------------------------------------------------------
    // Persona directory
    // -----------------------------------------------------------------------

    /// Start the single directory fetch for this session.
    ///
    /// Returns `None` if it was already started.
    pub fn start_directory_fetch(&mut self) -> Option<DirectoryFetch<B>> {
        if self.directory_requested {
            return None;
        }
        self.directory_requested = true;
        Some(DirectoryFetch {
            backend: Arc::clone(&self.backend),
        })
    }

    /// Record the directory fetch result. Ignored once the directory has
    /// already resolved.
    pub fn apply_directory(&mut self, result: Result<PersonaSet, DirectoryError>) {
        if !self.directory.is_loading() {
            warn!("persona directory already resolved, ignoring late result");
            return;
        }
        match &result {
            Ok(set) => info!(count = set.len(), "persona directory loaded"),
            Err(e) => warn!(error = %e, "persona directory unavailable"),
        }
        self.directory = PersonaDirectory::from_result(result);
    }

    /// Fetch the persona directory and record the result. Does nothing if
    /// the fetch was already started.
    pub async fn initialize(&mut self) {
        if let Some(fetch) = self.start_directory_fetch() {
            let result = fetch.run().await;
            self.apply_directory(result);
        }
    }

    // -----------------------------------------------------------------------
    // Session setup
    // -----------------------------------------------------------------------

    pub fn confirm_name(&mut self, name: &str) -> Result<(), NameError> {
        let result = self.session.confirm_name(name);
        match &result {
            Ok(()) => {
                self.name_error = None;
                info!(session_id = %self.session.session_id(), "student name confirmed");
            }
            Err(e) => self.name_error = Some(e.clone()),
        }
        result
    }

    /// Select a persona by exact name or by its 1-based position in the
    /// directory listing.
    pub fn select_persona(&mut self, persona: &str) -> Result<(), PersonaError> {
        let chosen = self.directory.select(persona)?.to_string();
        debug!(persona = %chosen, "persona selected");
        self.session.set_persona(chosen);
        Ok(())
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Why a send right now would be refused, if it would.
    pub fn check_send(&self) -> Result<(), SendRejected> {
        if self.in_flight.is_some() {
            return Err(SendRejected::RequestPending);
        }
        if !self.session.name_confirmed() {
            return Err(SendRejected::NameNotConfirmed);
        }
        if self.session.selected_persona().is_none() {
            return Err(SendRejected::NoPersona);
        }
        if self.draft.trim().is_empty() {
            return Err(SendRejected::EmptyDraft);
        }
        Ok(())
    }

    /// Whether the send affordance should be enabled.
    pub fn can_send(&self) -> bool {
        self.check_send().is_ok()
    }

    /// First phase of a send: append the user's message and hand back the
    /// request to dispatch. On rejection nothing changes.
    pub fn begin_send(&mut self) -> Result<PendingSend<B>, SendRejected> {
        self.check_send()?;

        let (Some(student_name), Some(persona)) =
            (self.session.student_name(), self.session.selected_persona())
        else {
            return Err(SendRejected::NameNotConfirmed);
        };

        let text = self.draft.trim().to_string();
        let request = ChatRequest {
            message: text.clone(),
            persona: persona.to_string(),
            student_name: student_name.to_string(),
            session_id: self.session.session_id().to_string(),
        };

        self.transcript.push(Message::new(Sender::User, text));
        self.draft.clear();
        self.last_failure = None;

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.in_flight = Some(seq);

        debug!(seq, persona = %request.persona, "chat request dispatched");
        Ok(PendingSend {
            backend: Arc::clone(&self.backend),
            request,
            seq,
        })
    }

    /// Second phase of a send: record the reply or the failure and return to
    /// idle. An outcome that does not belong to the pending request is
    /// dropped.
    pub fn complete_send(&mut self, outcome: SendOutcome) -> SendStatus {
        if self.in_flight != Some(outcome.seq) {
            warn!(seq = outcome.seq, "chat reply does not match the pending request, dropping");
            return SendStatus::Rejected(SendRejected::NotPending);
        }
        self.in_flight = None;

        match outcome.result {
            Ok(reply) => {
                debug!(seq = outcome.seq, "chat reply received");
                self.transcript.push(Message::new(Sender::Bot, reply));
                SendStatus::Replied
            }
            Err(failure) => {
                warn!(seq = outcome.seq, error = %failure, "chat request failed");
                self.transcript.push(Message::new(Sender::System, failure.to_string()));
                self.last_failure = Some(failure.clone());
                SendStatus::Failed(failure)
            }
        }
    }

    /// Send the current draft and wait for the round trip.
    ///
    /// A rejected send changes nothing and issues no request.
    pub async fn send(&mut self) -> SendStatus {
        let pending = match self.begin_send() {
            Ok(pending) => pending,
            Err(reason) => {
                debug!(reason = %reason, "send ignored");
                return SendStatus::Rejected(reason);
            }
        };
        let outcome = pending.dispatch().await;
        self.complete_send(outcome)
    }
}
