//! Project orchestrator
//!
//! Fans a [`ProjectRequest`] out to all seven agents, waits for every one of
//! them, and assembles the [`Aggregate`]. The client and cache are injected
//! once at startup and shared by every task; call [`Orchestrator::shutdown`]
//! on exit to release the cache.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agents::{AgentEnvelope, AgentKind, AgentTask};
use crate::cache::{self, Cache, CacheKeys};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::llm::GenerationClient;
use crate::project::{ProjectId, ProjectRequest};

/// Tunables shared by every agent task
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub keys: CacheKeys,
    pub max_tokens: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keys: CacheKeys::from_config(&config.cache),
            max_tokens: config.llm.max_tokens,
        }
    }
}

/// One envelope per agent, serialized in slot order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSlots {
    pub planner: AgentEnvelope,
    pub ideation: AgentEnvelope,
    pub research: AgentEnvelope,
    pub planning: AgentEnvelope,
    pub coding: AgentEnvelope,
    pub presentation: AgentEnvelope,
    pub evaluator: AgentEnvelope,
}

impl AgentSlots {
    /// Build from envelopes given in [`AgentKind::ALL`] order
    fn from_ordered(envelopes: Vec<AgentEnvelope>) -> Option<Self> {
        let [
            planner,
            ideation,
            research,
            planning,
            coding,
            presentation,
            evaluator,
        ]: [AgentEnvelope; 7] = envelopes.try_into().ok()?;

        Some(Self {
            planner,
            ideation,
            research,
            planning,
            coding,
            presentation,
            evaluator,
        })
    }

    pub fn get(&self, kind: AgentKind) -> &AgentEnvelope {
        match kind {
            AgentKind::Planner => &self.planner,
            AgentKind::Ideation => &self.ideation,
            AgentKind::Research => &self.research,
            AgentKind::Planning => &self.planning,
            AgentKind::Coding => &self.coding,
            AgentKind::Presentation => &self.presentation,
            AgentKind::Evaluator => &self.evaluator,
        }
    }

    /// Envelopes paired with their kind, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (AgentKind, &AgentEnvelope)> {
        AgentKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    pub fn failures(&self) -> usize {
        self.iter().filter(|(_, env)| !env.is_success()).count()
    }
}

/// Result of one project request; never mutated after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub project_id: ProjectId,
    pub title: String,
    pub brief: String,
    pub time_hours: u32,
    pub agents: AgentSlots,
}

/// Runs agent fan-out for project requests
pub struct Orchestrator {
    client: Arc<dyn GenerationClient>,
    cache: Arc<dyn Cache>,
    settings: OrchestratorSettings,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("model", &self.client.model())
            .field("cache", &self.cache.backend())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        cache: Arc<dyn Cache>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            client,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    fn task(&self, kind: AgentKind) -> AgentTask {
        AgentTask::new(
            kind,
            Arc::clone(&self.client),
            Arc::clone(&self.cache),
            self.settings.keys.clone(),
            self.settings.max_tokens,
        )
    }

    /// Run every agent for `request` and assemble the aggregate
    ///
    /// Only an invalid request is an error. Agent failures are carried as
    /// `Failure` envelopes inside the aggregate.
    pub async fn create_project(&self, request: ProjectRequest) -> Result<Aggregate> {
        request.validate()?;

        let project_id = request.project_id();
        let started = Instant::now();
        info!(
            project_id = %project_id,
            title = %request.title,
            time_hours = request.time_hours,
            "Creating project"
        );

        let tasks: Vec<AgentTask> = AgentKind::ALL.into_iter().map(|k| self.task(k)).collect();
        let futures: Vec<_> = tasks
            .iter()
            .map(|task| task.run(&project_id, &request))
            .collect();

        // join_all yields results in input order, whatever order they finish in
        let envelopes = join_all(futures).await;

        let agents = AgentSlots::from_ordered(envelopes).ok_or_else(|| {
            Error::Other("agent fan-out returned the wrong number of results".to_string())
        })?;

        let aggregate = Aggregate {
            project_id: project_id.clone(),
            title: request.title,
            brief: request.brief,
            time_hours: request.time_hours,
            agents,
        };

        match serde_json::to_value(&aggregate) {
            Ok(value) => {
                cache::best_effort_set(
                    self.cache.as_ref(),
                    &self.settings.keys.aggregate_key(&project_id),
                    &value,
                    self.settings.keys.aggregate_ttl,
                )
                .await;
            }
            Err(e) => warn!(project_id = %project_id, error = %e, "Aggregate not cacheable"),
        }

        info!(
            project_id = %project_id,
            failures = aggregate.agents.failures(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Project created"
        );

        Ok(aggregate)
    }

    /// Read a previously cached aggregate
    pub async fn load_project(&self, project_id: &ProjectId) -> Result<Option<Aggregate>> {
        load_aggregate(self.cache.as_ref(), &self.settings.keys, project_id).await
    }

    /// Release the cache; the orchestrator should not be used afterwards
    pub async fn shutdown(&self) {
        debug!(backend = self.cache.backend(), "Shutting down orchestrator");
        self.cache.close().await;
    }
}

/// Read a cached aggregate without a generation client
///
/// Backend errors propagate; an undecodable value is treated as absent.
pub async fn load_aggregate(
    cache: &dyn Cache,
    keys: &CacheKeys,
    project_id: &ProjectId,
) -> Result<Option<Aggregate>> {
    let Some(value) = cache.get(&keys.aggregate_key(project_id)).await? else {
        debug!(project_id = %project_id, "No cached aggregate");
        return Ok(None);
    };

    match serde_json::from_value(value) {
        Ok(aggregate) => Ok(Some(aggregate)),
        Err(e) => {
            warn!(project_id = %project_id, error = %e, "Ignoring undecodable aggregate");
            Ok(None)
        }
    }
}
