//! Agent result envelopes
//!
//! Serialized untagged, so the JSON is either `{"raw": ..., "parsed": ...}` or
//! `{"error": ...}`. The same shape is what the cache stores.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Outcome of one agent call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentEnvelope {
    Success(AgentOutput),
    Failure(AgentFailure),
}

/// A model answer and whatever JSON could be recovered from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Verbatim model text
    pub raw: String,
    /// Extracted JSON; absent when extraction found nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
    /// Presentation only: `Some(None)` serializes as `"slides_link": null`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_field"
    )]
    pub slides_link: Option<Option<String>>,
}

/// An agent whose generation call failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    pub error: String,
}

/// Distinguishes a field present as `null` from a missing field
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl AgentEnvelope {
    /// Successful envelope for `raw` text
    pub fn success(raw: impl Into<String>, parsed: Option<Value>) -> Self {
        Self::Success(AgentOutput {
            raw: raw.into(),
            parsed,
            slides_link: None,
        })
    }

    /// Failed envelope carrying an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(AgentFailure {
            error: error.into(),
        })
    }

    /// Lift `parsed.slides_link` to the top level; a missing link becomes null
    pub fn with_slides_link(self) -> Self {
        match self {
            Self::Success(mut output) => {
                let link = output
                    .parsed
                    .as_ref()
                    .and_then(Value::as_object)
                    .and_then(|map| map.get("slides_link"))
                    .and_then(Value::as_str)
                    .filter(|link| !link.trim().is_empty())
                    .map(str::to_string);
                output.slides_link = Some(link);
                Self::Success(output)
            }
            failure => failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Success(output) => Some(&output.raw),
            Self::Failure(_) => None,
        }
    }

    pub fn parsed(&self) -> Option<&Value> {
        match self {
            Self::Success(output) => output.parsed.as_ref(),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.error),
        }
    }

    pub fn slides_link(&self) -> Option<&str> {
        match self {
            Self::Success(output) => output.slides_link.as_ref()?.as_deref(),
            Self::Failure(_) => None,
        }
    }
}
