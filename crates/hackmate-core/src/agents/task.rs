//! Agent task - one cached generation call
//!
//! The same algorithm runs for every [`AgentKind`]:
//!
//! 1. build the kind's prompt
//! 2. derive `{root}:{project_id}:{kind}:{sha256(prompt)}`
//! 3. return a cached envelope unchanged if there is one
//! 4. otherwise call the generation backend and extract JSON from the answer,
//!    turning a backend error into a `Failure` envelope
//! 5. write the envelope back (best effort) before returning it

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::prompts::build_prompt;
use super::{AgentEnvelope, AgentKind};
use crate::cache::{self, Cache, CacheKeys};
use crate::extract;
use crate::llm::GenerationClient;
use crate::project::{ProjectId, ProjectRequest};

/// A single agent bound to its collaborators
#[derive(Clone)]
pub struct AgentTask {
    kind: AgentKind,
    client: Arc<dyn GenerationClient>,
    cache: Arc<dyn Cache>,
    keys: CacheKeys,
    max_tokens: u32,
}

impl std::fmt::Debug for AgentTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTask")
            .field("kind", &self.kind)
            .field("model", &self.client.model())
            .field("cache", &self.cache.backend())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AgentTask {
    pub fn new(
        kind: AgentKind,
        client: Arc<dyn GenerationClient>,
        cache: Arc<dyn Cache>,
        keys: CacheKeys,
        max_tokens: u32,
    ) -> Self {
        Self {
            kind,
            client,
            cache,
            keys,
            max_tokens,
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Run the agent; never fails, errors come back as `Failure` envelopes
    pub async fn run(&self, project_id: &ProjectId, request: &ProjectRequest) -> AgentEnvelope {
        let prompt = build_prompt(self.kind, request);
        let key = self.keys.agent_key(project_id, self.kind, &prompt);

        if let Some(cached) = self.cached_envelope(&key).await {
            debug!(
                project_id = %project_id,
                agent = %self.kind,
                "Replaying cached envelope"
            );
            return cached;
        }

        let envelope = self.generate(project_id, &prompt).await;

        match serde_json::to_value(&envelope) {
            Ok(value) => {
                cache::best_effort_set(self.cache.as_ref(), &key, &value, self.keys.agent_ttl)
                    .await;
            }
            Err(e) => warn!(agent = %self.kind, error = %e, "Envelope not cacheable"),
        }

        envelope
    }

    /// Cached envelope for `key`; undecodable values count as a miss
    async fn cached_envelope(&self, key: &str) -> Option<AgentEnvelope> {
        let value = cache::best_effort_get(self.cache.as_ref(), key).await?;
        decode_envelope(value)
            .inspect_err(|e| {
                warn!(
                    key = %key,
                    error = %e,
                    "Ignoring undecodable cache entry"
                )
            })
            .ok()
    }

    /// Call the backend and wrap the outcome
    async fn generate(&self, project_id: &ProjectId, prompt: &str) -> AgentEnvelope {
        let started = Instant::now();
        debug!(
            project_id = %project_id,
            agent = %self.kind,
            prompt_len = prompt.len(),
            "Calling generation backend"
        );

        let envelope = match self.client.complete(prompt, self.max_tokens).await {
            Ok(text) => {
                let extracted = extract::extract(&text);
                info!(
                    project_id = %project_id,
                    agent = %self.kind,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    strategy = extracted.as_ref().map_or("none", |(_, s)| s.as_str()),
                    "Agent completed"
                );
                AgentEnvelope::success(text, extracted.map(|(value, _)| value))
            }
            Err(e) if e.is_upstream() => {
                warn!(
                    project_id = %project_id,
                    agent = %self.kind,
                    code = e.code(),
                    error = %e,
                    "Agent failed"
                );
                AgentEnvelope::failure(e.to_string())
            }
            Err(e) => {
                error!(
                    project_id = %project_id,
                    agent = %self.kind,
                    code = e.code(),
                    error = %e,
                    "Agent failed outside the generation backend"
                );
                AgentEnvelope::failure(e.to_string())
            }
        };

        if self.kind == AgentKind::Presentation {
            envelope.with_slides_link()
        } else {
            envelope
        }
    }
}

fn decode_envelope(value: Value) -> serde_json::Result<AgentEnvelope> {
    serde_json::from_value(value)
}
