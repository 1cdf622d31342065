//! Agent system - seven independent generation agents
//!
//! Each agent turns a project request into one prompt, answers it through the
//! cache or the generation backend, and reports an [`AgentEnvelope`].

pub mod envelope;
pub mod prompts;
pub mod task;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use envelope::{AgentEnvelope, AgentFailure, AgentOutput};
pub use task::AgentTask;

/// Agent kinds, in aggregate slot order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Planner,
    Ideation,
    Research,
    Planning,
    Coding,
    Presentation,
    Evaluator,
}

impl AgentKind {
    /// Every kind, in slot order
    pub const ALL: [AgentKind; 7] = [
        AgentKind::Planner,
        AgentKind::Ideation,
        AgentKind::Research,
        AgentKind::Planning,
        AgentKind::Coding,
        AgentKind::Presentation,
        AgentKind::Evaluator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Ideation => "ideation",
            Self::Research => "research",
            Self::Planning => "planning",
            Self::Coding => "coding",
            Self::Presentation => "presentation",
            Self::Evaluator => "evaluator",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown agent kind '{}'", s)))
    }
}
