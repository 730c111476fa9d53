//! Staleness-aware content retrieval for a sector.
//!
//! [`RetrievalService`] is the explicit process-wide service object: it
//! owns the topic store, the TTL cache, and the upstream clients, is
//! constructed once at startup, and is passed by reference into every
//! request. `topic_content` always produces an answer; refresh and
//! enrichment failures degrade to "serve what is stored".

use std::time::Duration;

use chrono::Utc;
use sectorwise_cache::{TtlCache, academic_key, api_key};
use sectorwise_clients::{AcademicApi, SectorApi};
use sectorwise_shared::{AcademicResource, Result, RetrievalPolicyConfig, SectorPayload};
use sectorwise_storage::Storage;
use tracing::{debug, error, instrument, warn};

use crate::freshness::FreshnessPolicy;
use crate::search::{RelevanceScorer, UniformScorer};

/// Fixed answer for a sector with no stored topic. A normal outcome.
pub const NO_INFORMATION_ANSWER: &str = "I'm sorry, I don't have information on that sector.";

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Source of authoritative sector content. Implemented by [`SectorApi`];
/// tests substitute scripted fakes.
#[allow(async_fn_in_trait)]
pub trait RefreshFetcher {
    /// Fetch the replacement payload for `sector`.
    async fn fetch(&self, sector: &str) -> Result<SectorPayload>;
}

/// Source of supplementary academic resources. Implemented by
/// [`AcademicApi`]; tests substitute scripted fakes.
#[allow(async_fn_in_trait)]
pub trait AcademicFetcher {
    /// Fetch the academic resources for `sector`, in feed order.
    async fn fetch(&self, sector: &str) -> Result<Vec<AcademicResource>>;
}

impl RefreshFetcher for SectorApi {
    async fn fetch(&self, sector: &str) -> Result<SectorPayload> {
        SectorApi::fetch(self, sector).await
    }
}

impl AcademicFetcher for AcademicApi {
    async fn fetch(&self, sector: &str) -> Result<Vec<AcademicResource>> {
        AcademicApi::fetch(self, sector).await
    }
}

/// Answer synthesis over an assembled context. The shipped
/// [`TemplateAnswerer`] is a placeholder strategy; real synthesis is
/// injected by the embedding application.
pub trait Answerer: Send + Sync {
    /// Produce the final answer text for `question` given `context`.
    fn answer(&self, context: &str, question: &str) -> String;
}

/// Placeholder answerer: echoes the assembled context under the question.
pub struct TemplateAnswerer;

impl Answerer for TemplateAnswerer {
    fn answer(&self, context: &str, question: &str) -> String {
        format!("Answer to \"{question}\" based on stored material:\n{context}")
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Runtime knobs for the retrieval pipeline, built from the
/// `[retrieval]` config section.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Staleness window for stored topics.
    pub staleness_window: chrono::Duration,
    /// TTL for `api_<sector>` cache entries.
    pub api_cache_ttl: Duration,
    /// TTL for `academic_<sector>` cache entries.
    pub academic_cache_ttl: Duration,
    /// Maximum number of search results returned.
    pub search_limit: usize,
}

impl From<&RetrievalPolicyConfig> for ServiceConfig {
    fn from(config: &RetrievalPolicyConfig) -> Self {
        Self {
            staleness_window: chrono::Duration::days(config.staleness_days),
            api_cache_ttl: Duration::from_secs(config.api_cache_ttl_secs),
            academic_cache_ttl: Duration::from_secs(config.academic_cache_ttl_secs),
            search_limit: config.search_limit,
        }
    }
}

/// The final response for a content request. Always produced, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicAnswer {
    /// Answer text.
    pub answer: String,
    /// Further-reading link, when the topic carries one.
    pub link: Option<String>,
}

/// Process-wide retrieval service: owned handles to store, cache, and
/// clients, plus the injected answer/relevance strategies.
pub struct RetrievalService<R, A> {
    pub(crate) storage: Storage,
    cache: TtlCache,
    refresh: R,
    academic: A,
    policy: FreshnessPolicy,
    answerer: Box<dyn Answerer>,
    pub(crate) scorer: Box<dyn RelevanceScorer>,
    pub(crate) config: ServiceConfig,
}

impl<R: RefreshFetcher, A: AcademicFetcher> RetrievalService<R, A> {
    /// Assemble the service with the default placeholder strategies.
    pub fn new(
        storage: Storage,
        cache: TtlCache,
        refresh: R,
        academic: A,
        config: ServiceConfig,
    ) -> Self {
        let policy = FreshnessPolicy::new(config.staleness_window);
        Self {
            storage,
            cache,
            refresh,
            academic,
            policy,
            answerer: Box::new(TemplateAnswerer),
            scorer: Box::new(UniformScorer::default()),
            config,
        }
    }

    /// Replace the answer-synthesis strategy.
    pub fn with_answerer(mut self, answerer: Box<dyn Answerer>) -> Self {
        self.answerer = answerer;
        self
    }

    /// Replace the relevance-scoring strategy.
    pub fn with_scorer(mut self, scorer: Box<dyn RelevanceScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Answer a content question for `sector`.
    ///
    /// Offline mode skips both the refresh step and the academic
    /// enrichment, serving only stored content. Every failure mode ends
    /// in a textual answer; this method never returns an error.
    #[instrument(skip_all, fields(sector = %sector, offline))]
    pub async fn topic_content(&self, question: &str, sector: &str, offline: bool) -> TopicAnswer {
        match self.topic_content_inner(question, sector, offline).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(sector, error = %e, "content retrieval failed");
                TopicAnswer {
                    answer: format!("An error occurred: {e}"),
                    link: None,
                }
            }
        }
    }

    async fn topic_content_inner(
        &self,
        question: &str,
        sector: &str,
        offline: bool,
    ) -> Result<TopicAnswer> {
        if !offline {
            self.refresh_if_stale(sector).await?;
        }

        let Some(topic) = self.storage.get_topic(sector).await? else {
            debug!(sector, "no stored topic");
            return Ok(TopicAnswer {
                answer: NO_INFORMATION_ANSWER.to_string(),
                link: None,
            });
        };

        let mut context = topic.content;
        if !offline {
            if let Some(resources) = self.academic_resources(sector).await {
                for resource in &resources {
                    context.push('\n');
                    context.push_str(&resource.summary);
                }
            }
        }

        Ok(TopicAnswer {
            answer: self.answerer.answer(&context, question),
            link: topic.further_reading,
        })
    }

    /// Refresh the stored topic when the freshness policy says so.
    ///
    /// A failed upstream fetch is logged and swallowed: the request
    /// proceeds with whatever is currently stored. Concurrent requests
    /// for the same sector may each refresh independently; the last
    /// completed write wins.
    async fn refresh_if_stale(&self, sector: &str) -> Result<()> {
        let stored = self.storage.get_topic(sector).await?;
        if !self
            .policy
            .needs_refresh(stored.map(|t| t.last_update), Utc::now())
        {
            return Ok(());
        }

        debug!(sector, "stored topic stale or absent, refreshing");
        match self.refresh.fetch(sector).await {
            Ok(payload) => {
                self.storage
                    .upsert_topic(
                        sector,
                        &payload.content,
                        payload.further_reading.as_deref(),
                        Utc::now(),
                    )
                    .await?;
                if let Ok(json) = serde_json::to_string(&payload) {
                    self.cache
                        .set(&api_key(sector), json, self.config.api_cache_ttl)
                        .await;
                }
            }
            Err(e) => {
                warn!(sector, error = %e, "refresh failed, serving stored content");
            }
        }
        Ok(())
    }

    /// Academic resources for `sector`, read-through the TTL cache.
    ///
    /// `None` means "no enrichment available": a fetch failure or a
    /// malformed payload never fails the overall request.
    async fn academic_resources(&self, sector: &str) -> Option<Vec<AcademicResource>> {
        let key = academic_key(sector);

        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_str(&cached) {
                Ok(resources) => return Some(resources),
                Err(e) => {
                    warn!(sector, error = %e, "discarding malformed cached academic entry");
                }
            }
        }

        match self.academic.fetch(sector).await {
            Ok(resources) => {
                if let Ok(json) = serde_json::to_string(&resources) {
                    self.cache
                        .set(&key, json, self.config.academic_cache_ttl)
                        .await;
                }
                Some(resources)
            }
            Err(e) => {
                warn!(sector, error = %e, "academic fetch failed, proceeding without enrichment");
                None
            }
        }
    }
}
