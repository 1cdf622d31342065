//! HackMate Core Library
//!
//! This crate provides the core functionality for HackMate, including:
//! - Generation client (Gemini `generateContent` API)
//! - Content-addressed response cache (SQLite, in-memory, or disabled)
//! - Tolerant JSON extraction from free-form model output
//! - Agent tasks (planner, ideation, research, planning, coding, presentation, evaluator)
//! - Orchestrator fanning a project request out to every agent
//! - Slide deck and code artifacts
//! - Configuration and health checks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hackmate_core::{cache, config::Config, llm::GeminiClient, project::ProjectRequest};
//! use hackmate_core::orchestrator::{Orchestrator, OrchestratorSettings};
//!
//! let config = Config::load()?;
//! let client = Arc::new(GeminiClient::from_config(&config.llm)?);
//! let cache = cache::connect(&config.cache).await;
//! let orchestrator = Orchestrator::new(client, cache, OrchestratorSettings::from_config(&config));
//!
//! let aggregate = orchestrator
//!     .create_project(ProjectRequest::new("Recipe Bot", "helps find recipes from ingredients"))
//!     .await?;
//! orchestrator.shutdown().await;
//! ```

pub mod agents;
pub mod artifacts;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod health;
pub mod llm;
pub mod orchestrator;
pub mod project;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agents::{AgentEnvelope, AgentKind};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::orchestrator::{Aggregate, Orchestrator, OrchestratorSettings};
    pub use crate::project::{ProjectId, ProjectRequest};
}
