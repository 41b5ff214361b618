use uuid::Uuid;

use crate::error::NameError;

/// Identity and persona choice for one visit.
///
/// The session id is generated at construction. The student name is empty
/// until [`Session::confirm_name`] accepts one, after which it never changes.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    student_name: String,
    name_confirmed: bool,
    selected_persona: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            student_name: String::new(),
            name_confirmed: false,
            selected_persona: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The confirmed name, or `None` before confirmation.
    pub fn student_name(&self) -> Option<&str> {
        self.name_confirmed.then_some(self.student_name.as_str())
    }

    pub fn name_confirmed(&self) -> bool {
        self.name_confirmed
    }

    pub fn selected_persona(&self) -> Option<&str> {
        self.selected_persona.as_deref()
    }

    /// Confirm `candidate` as the student name.
    ///
    /// The name is trimmed. Blank names are refused. Once confirmed, the same
    /// name is accepted again without effect and any other name is refused.
    pub fn confirm_name(&mut self, candidate: &str) -> Result<(), NameError> {
        let name = candidate.trim();
        if self.name_confirmed {
            return if name == self.student_name {
                Ok(())
            } else {
                Err(NameError::AlreadyConfirmed {
                    current: self.student_name.clone(),
                })
            };
        }
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        self.student_name = name.to_string();
        self.name_confirmed = true;
        Ok(())
    }

    pub(crate) fn set_persona(&mut self, persona: String) {
        self.selected_persona = Some(persona);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
