//! Terminal front end: name entry, persona selection, the scrolling chat log
//! and the message box, drawn on stdout and driven from stdin.

use std::future::Future;
use std::pin::Pin;

use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::backend::ChatBackend;
use crate::controller::{ChatSessionController, PendingSend, SendOutcome};
use crate::directory::{PersonaDirectory, PersonaSet};
use crate::error::{ChatError, DirectoryError, SendRejected};
use crate::transcript::{Message, ScrollAnchor, Sender, Transcript};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Quit,
    Help,
    Personas,
    Persona(String),
    /// Send the current draft as is.
    Send,
    /// Show the current draft.
    Draft,
    Unknown(String),
    /// Anything that is not a command.
    Text(String),
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Text(trimmed.to_string());
    };
    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    match name {
        "quit" | "exit" | "q" => Input::Quit,
        "help" | "h" | "?" => Input::Help,
        "personas" => Input::Personas,
        "persona" if rest.is_empty() => Input::Personas,
        "persona" => Input::Persona(rest.to_string()),
        "send" => Input::Send,
        "draft" => Input::Draft,
        _ => Input::Unknown(name.to_string()),
    }
}

pub const HELP: &str = "\
Commands:
  /personas            list available personas
  /persona <name|n>    choose who you are interviewing
  /send                send the current draft
  /draft               show the current draft
  /help                show this help
  /quit                leave the session
Anything else is sent as a message.";

/// Format one transcript entry for display.
pub fn render_message(message: &Message, persona: Option<&str>) -> String {
    match message.sender() {
        Sender::User => format!("{} {}", "you:".bright_cyan().bold(), message.text()),
        Sender::Bot => {
            let label = format!("{}:", persona.unwrap_or("bot"));
            format!("{} {}", label.bright_green().bold(), message.text())
        }
        Sender::System => format!("{} {}", "system:".bright_red().bold(), message.text().bright_red()),
    }
}

/// Lines describing the directory state.
pub fn render_directory(directory: &PersonaDirectory, selected: Option<&str>) -> Vec<String> {
    match directory {
        PersonaDirectory::Loading => vec!["Loading personas…".bright_yellow().to_string()],
        PersonaDirectory::Failed(e) => vec![
            format!("Persona directory unavailable: {e}").bright_red().to_string(),
            "Restart the session to try again.".to_string(),
        ],
        PersonaDirectory::Loaded(set) if set.is_empty() => {
            vec!["The backend has no personas available.".bright_yellow().to_string()]
        }
        PersonaDirectory::Loaded(set) => render_persona_list(set, selected),
    }
}

fn render_persona_list(set: &PersonaSet, selected: Option<&str>) -> Vec<String> {
    let mut lines = vec!["Personas:".bright_white().bold().to_string()];
    for (i, name) in set.iter().enumerate() {
        let marker = if Some(name) == selected { "*" } else { " " };
        lines.push(format!(" {marker} {:>2}. {name}", i + 1));
    }
    lines
}

/// Hint shown when a send is refused.
pub fn rejection_hint(reason: SendRejected) -> &'static str {
    match reason {
        SendRejected::NameNotConfirmed => "Enter your name first.",
        SendRejected::NoPersona => "Choose a persona with /persona before sending.",
        SendRejected::EmptyDraft => "Nothing to send.",
        SendRejected::RequestPending => {
            "Still waiting for a reply; your message is kept as a draft. Use /send once the reply arrives."
        }
        SendRejected::NotPending => "No reply was expected.",
    }
}

/// Prints transcript entries as they are appended.
#[derive(Debug, Default)]
pub struct TerminalView {
    anchor: ScrollAnchor,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print everything appended since the previous call.
    pub fn flush(&mut self, transcript: &Transcript, persona: Option<&str>) {
        for message in self.anchor.take_new(transcript) {
            println!("{}", render_message(message, persona));
        }
    }
}

/// What the loop should do after a line of input.
enum Step<B> {
    Continue,
    Quit,
    Dispatch(PendingSend<B>),
}

/// Run an interactive session until `/quit` or end of input.
///
/// The persona directory fetch starts immediately and runs alongside input
/// handling and any in-flight chat request.
pub async fn run_chat<B: ChatBackend + 'static>(
    controller: &mut ChatSessionController<B>,
    name: Option<String>,
    mut wanted_persona: Option<String>,
) -> Result<(), ChatError> {
    let mut view = TerminalView::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", "Simulated Interview Chat".bright_cyan().bold());
    println!("{}", "=".repeat(40).bright_blue());

    let mut directory_fetch: Option<BoxFuture<Result<PersonaSet, DirectoryError>>> = controller
        .start_directory_fetch()
        .map(|fetch| Box::pin(fetch.run()) as BoxFuture<_>);
    let mut pending_send: Option<BoxFuture<SendOutcome>> = None;

    print_directory(controller);

    if let Some(name) = name {
        if let Err(e) = controller.confirm_name(&name) {
            println!("{}", e.to_string().bright_red());
        }
    }
    if controller.session().name_confirmed() {
        greet(controller);
    } else {
        println!("Enter your name:");
    }

    loop {
        tokio::select! {
            result = next_from(&mut directory_fetch) => {
                directory_fetch = None;
                directory_arrived(controller, result, wanted_persona.take());
                print_directory(controller);
            }
            outcome = next_from(&mut pending_send) => {
                pending_send = None;
                controller.complete_send(outcome);
                view.flush(controller.transcript(), controller.session().selected_persona());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // End of input: let an in-flight reply land before leaving.
                    if let Some(fut) = pending_send.take() {
                        controller.complete_send(fut.await);
                        view.flush(controller.transcript(), controller.session().selected_persona());
                    }
                    break;
                };
                match handle_line(controller, &line) {
                    Step::Continue => {}
                    Step::Quit => break,
                    Step::Dispatch(pending) => {
                        pending_send = Some(Box::pin(pending.dispatch()) as BoxFuture<_>);
                        println!("{}", "…".dimmed());
                    }
                }
                view.flush(controller.transcript(), controller.session().selected_persona());
            }
        }
    }

    if pending_send.is_some() {
        println!("{}", "Leaving with a reply still pending.".dimmed());
    }
    Ok(())
}

/// Record the directory result, then apply a persona chosen up front.
fn directory_arrived<B: ChatBackend>(
    controller: &mut ChatSessionController<B>,
    result: Result<PersonaSet, DirectoryError>,
    wanted_persona: Option<String>,
) {
    controller.apply_directory(result);
    if let Some(persona) = wanted_persona {
        if let Err(e) = controller.select_persona(&persona) {
            println!("{}", e.to_string().bright_red());
        }
    }
}

async fn next_from<T>(slot: &mut Option<BoxFuture<T>>) -> T {
    match slot.as_mut() {
        Some(fut) => fut.as_mut().await,
        None => std::future::pending().await,
    }
}

fn handle_line<B: ChatBackend>(controller: &mut ChatSessionController<B>, line: &str) -> Step<B> {
    if !controller.session().name_confirmed() {
        match parse_input(line) {
            Input::Quit => return Step::Quit,
            Input::Help => {
                println!("{HELP}");
                println!("Enter your name:");
                return Step::Continue;
            }
            _ => {}
        }
        match controller.confirm_name(line) {
            Ok(()) => greet(controller),
            Err(e) => {
                println!("{}", e.to_string().bright_red());
                println!("Enter your name:");
            }
        }
        return Step::Continue;
    }

    match parse_input(line) {
        Input::Empty => Step::Continue,
        Input::Quit => Step::Quit,
        Input::Help => {
            println!("{HELP}");
            Step::Continue
        }
        Input::Personas => {
            print_directory(controller);
            Step::Continue
        }
        Input::Persona(persona) => {
            match controller.select_persona(&persona) {
                Ok(()) => {
                    let chosen = controller.session().selected_persona().unwrap_or_default();
                    println!("Now interviewing {}.", chosen.bright_green().bold());
                }
                Err(e) => println!("{}", e.to_string().bright_red()),
            }
            Step::Continue
        }
        Input::Draft => {
            if controller.draft().is_empty() {
                println!("{}", "(draft is empty)".dimmed());
            } else {
                println!("{} {}", "draft:".dimmed(), controller.draft());
            }
            Step::Continue
        }
        Input::Send => try_send(controller),
        Input::Unknown(name) => {
            println!("Unknown command /{name}. Type /help for commands.");
            Step::Continue
        }
        Input::Text(text) => {
            controller.set_draft(text);
            try_send(controller)
        }
    }
}

fn try_send<B: ChatBackend>(controller: &mut ChatSessionController<B>) -> Step<B> {
    match controller.begin_send() {
        Ok(pending) => Step::Dispatch(pending),
        Err(reason) => {
            println!("{}", rejection_hint(reason).bright_yellow());
            Step::Continue
        }
    }
}

fn greet<B: ChatBackend>(controller: &ChatSessionController<B>) {
    if let Some(name) = controller.session().student_name() {
        println!("Welcome, {}. Type /help for commands.", name.bright_white().bold());
    }
}

fn print_directory<B: ChatBackend>(controller: &ChatSessionController<B>) {
    for line in render_directory(controller.directory(), controller.session().selected_persona()) {
        println!("{line}");
    }
}
