use serde::{Deserialize, Deserializer, Serialize};

// -- Persona directory ---------------------------------------------------------

/// Body of `GET {base}/`.
///
/// A missing or null `available_personas` field is read as an empty list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub available_personas: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// -- Chat ---------------------------------------------------------------------

/// Body of `POST {base}/chat`. All four fields are always sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub persona: String,
    pub student_name: String,
    pub session_id: String,
}

/// Body returned by `POST {base}/chat`, success or not.
///
/// `detail` is what FastAPI-style backends use for errors and may be a
/// string, a list of validation objects, or anything else; `error` is the
/// other historical spelling.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl ChatReply {
    /// The backend's error text, if the body carries one.
    pub fn error_text(&self) -> Option<String> {
        self.error
            .as_ref()
            .or(self.detail.as_ref())
            .filter(|v| !v.is_null())
            .map(value_text)
    }
}

/// Render a JSON value as display text: strings unquoted, everything else as
/// compact JSON.
pub fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
