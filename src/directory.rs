//! Persona directory: the list of characters the backend can play, fetched
//! once per session.

use serde::Serialize;

use crate::error::{DirectoryError, PersonaError};

/// The personas the backend advertised, in the order it listed them.
///
/// Duplicates are dropped on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonaSet {
    names: Vec<String>,
}

impl PersonaSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self { names: out }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, persona: &str) -> bool {
        self.names.iter().any(|n| n == persona)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Look up a persona by exact name, falling back to a 1-based position
    /// as shown in a numbered listing.
    pub fn resolve(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        if let Some(name) = self.names.iter().find(|n| n.as_str() == input) {
            return Some(name);
        }
        input
            .parse::<usize>()
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }
}

/// Load state of the persona directory.
///
/// `Loaded` with an empty set and `Failed` are different things: the first
/// means the backend has no personas, the second that we could not ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonaDirectory {
    Loading,
    Loaded(PersonaSet),
    Failed(DirectoryError),
}

impl PersonaDirectory {
    pub fn from_result(result: Result<PersonaSet, DirectoryError>) -> Self {
        match result {
            Ok(set) => PersonaDirectory::Loaded(set),
            Err(e) => PersonaDirectory::Failed(e),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PersonaDirectory::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, PersonaDirectory::Loaded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PersonaDirectory::Failed(_))
    }

    /// Personas available for selection. Empty unless loaded.
    pub fn personas(&self) -> &[String] {
        match self {
            PersonaDirectory::Loaded(set) => &set.names,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&DirectoryError> {
        match self {
            PersonaDirectory::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Check that `input` names a selectable persona and return its
    /// canonical spelling.
    pub fn select(&self, input: &str) -> Result<&str, PersonaError> {
        match self {
            PersonaDirectory::Loading => Err(PersonaError::DirectoryLoading),
            PersonaDirectory::Failed(_) => Err(PersonaError::DirectoryUnavailable),
            PersonaDirectory::Loaded(set) => set.resolve(input).ok_or_else(|| PersonaError::Unknown {
                persona: input.trim().to_string(),
            }),
        }
    }
}
