//! Ranked search over the topic corpus.
//!
//! Scans every stored topic (full scan — acceptable for a small corpus,
//! a documented scaling limit), scores each against the query with the
//! injected relevance strategy, and returns the top results in
//! descending score order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use sectorwise_shared::SearchHit;
use tracing::{debug, error, instrument};

use crate::retrieval::{AcademicFetcher, RefreshFetcher, RetrievalService};

/// Relevance scoring over a single topic.
///
/// Contract: deterministic given the same inputs; a result of zero or
/// less means "exclude this topic". The shipped [`UniformScorer`] is a
/// placeholder; the real formula is an injected policy.
pub trait RelevanceScorer: Send + Sync {
    /// Score `content` against `query`.
    fn score(
        &self,
        query: &str,
        content: &str,
        last_update: DateTime<Utc>,
        preferences: Option<&serde_json::Value>,
    ) -> f64;
}

/// Placeholder scorer: every topic gets the same constant weight.
pub struct UniformScorer {
    /// Score assigned to every topic.
    pub weight: f64,
}

impl Default for UniformScorer {
    fn default() -> Self {
        Self { weight: 0.5 }
    }
}

impl RelevanceScorer for UniformScorer {
    fn score(
        &self,
        _query: &str,
        _content: &str,
        _last_update: DateTime<Utc>,
        _preferences: Option<&serde_json::Value>,
    ) -> f64 {
        self.weight
    }
}

impl<R: RefreshFetcher, A: AcademicFetcher> RetrievalService<R, A> {
    /// Ranked search over all stored topics.
    ///
    /// Returns at most `search_limit` hits, scores strictly positive and
    /// non-increasing; ties keep corpus scan order. Hits carry full topic
    /// content — display snipping belongs to the caller. A storage
    /// failure yields an empty result set, never a fault.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn search(
        &self,
        query: &str,
        preferences: Option<&serde_json::Value>,
    ) -> Vec<SearchHit> {
        let topics = match self.storage.list_topics().await {
            Ok(topics) => topics,
            Err(e) => {
                error!(error = %e, "search scan failed");
                return Vec::new();
            }
        };

        // Audit row; a failed append never fails the search.
        if let Err(e) = self.storage.record_search(query).await {
            debug!(error = %e, "failed to record search history");
        }

        let mut hits: Vec<SearchHit> = topics
            .into_iter()
            .filter_map(|topic| {
                let score =
                    self.scorer
                        .score(query, &topic.content, topic.last_update, preferences);
                (score > 0.0).then_some(SearchHit {
                    sector: topic.sector,
                    content: topic.content,
                    score,
                })
            })
            .collect();

        // Stable sort keeps scan order for equal scores.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(self.config.search_limit);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::Duration;
    use sectorwise_cache::TtlCache;
    use sectorwise_shared::{
        AcademicResource, Result, RetrievalPolicyConfig, SectorPayload, SectorwiseError,
    };
    use sectorwise_storage::Storage;
    use uuid::Uuid;

    use crate::retrieval::ServiceConfig;

    /// Search never touches the network; both fetchers always fail.
    struct NeverFetch;

    impl RefreshFetcher for NeverFetch {
        async fn fetch(&self, _sector: &str) -> Result<SectorPayload> {
            Err(SectorwiseError::Transport("not used in search tests".into()))
        }
    }

    impl AcademicFetcher for NeverFetch {
        async fn fetch(&self, _sector: &str) -> Result<Vec<AcademicResource>> {
            Err(SectorwiseError::Transport("not used in search tests".into()))
        }
    }

    /// Scores topics by exact content lookup; unknown content scores 0.
    struct ScriptedScorer {
        by_content: HashMap<String, f64>,
    }

    impl ScriptedScorer {
        fn new(scores: &[(&str, f64)]) -> Self {
            Self {
                by_content: scores
                    .iter()
                    .map(|(content, score)| ((*content).to_string(), *score))
                    .collect(),
            }
        }
    }

    impl RelevanceScorer for ScriptedScorer {
        fn score(
            &self,
            _query: &str,
            content: &str,
            _last_update: DateTime<Utc>,
            _preferences: Option<&serde_json::Value>,
        ) -> f64 {
            self.by_content.get(content).copied().unwrap_or(0.0)
        }
    }

    async fn service_with_scorer(
        scorer: Box<dyn RelevanceScorer>,
    ) -> RetrievalService<NeverFetch, NeverFetch> {
        let tmp = std::env::temp_dir().join(format!("sw_search_test_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&tmp).await.expect("open test db");
        RetrievalService::new(
            storage,
            TtlCache::new(),
            NeverFetch,
            NeverFetch,
            ServiceConfig::from(&RetrievalPolicyConfig::default()),
        )
        .with_scorer(scorer)
    }

    async fn seed(svc: &RetrievalService<NeverFetch, NeverFetch>, sector: &str, content: &str) {
        svc.storage
            .upsert_topic(sector, content, None, Utc::now() - Duration::days(1))
            .await
            .expect("seed topic");
    }

    #[tokio::test]
    async fn zero_scores_are_excluded_and_order_is_descending() {
        let svc = service_with_scorer(Box::new(ScriptedScorer::new(&[
            ("gravity basics", 0.8),
            ("unrelated topic", 0.0),
            ("orbital mechanics", 0.3),
        ])))
        .await;
        seed(&svc, "physics", "gravity basics").await;
        seed(&svc, "history", "unrelated topic").await;
        seed(&svc, "astronomy", "orbital mechanics").await;

        let hits = svc.search("gravity", None).await;

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].sector, "physics");
        assert_eq!(hits[0].score, 0.8);
        assert_eq!(hits[1].sector, "astronomy");
        assert_eq!(hits[1].score, 0.3);
    }

    #[tokio::test]
    async fn results_are_capped_at_the_search_limit() {
        let scores: Vec<(String, f64)> = (0..15)
            .map(|i| (format!("topic body {i}"), 0.1 + i as f64 * 0.05))
            .collect();
        let scorer = ScriptedScorer {
            by_content: scores.iter().cloned().collect(),
        };
        let svc = service_with_scorer(Box::new(scorer)).await;
        for i in 0..15 {
            seed(&svc, &format!("sector-{i:02}"), &format!("topic body {i}")).await;
        }

        let hits = svc.search("anything", None).await;

        assert_eq!(hits.len(), 10);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(hits.iter().all(|h| h.score > 0.0));
    }

    #[tokio::test]
    async fn ties_keep_corpus_scan_order() {
        let svc = service_with_scorer(Box::new(ScriptedScorer::new(&[
            ("alpha body", 0.5),
            ("beta body", 0.5),
            ("gamma body", 0.5),
        ])))
        .await;
        // list_topics scans in sector order.
        seed(&svc, "alpha", "alpha body").await;
        seed(&svc, "beta", "beta body").await;
        seed(&svc, "gamma", "gamma body").await;

        let hits = svc.search("q", None).await;

        let sectors: Vec<&str> = hits.iter().map(|h| h.sector.as_str()).collect();
        assert_eq!(sectors, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn hits_carry_full_content() {
        let long_content = "x".repeat(1000);
        let svc = service_with_scorer(Box::new(UniformScorer::default())).await;
        svc.storage
            .upsert_topic("physics", &long_content, None, Utc::now())
            .await
            .unwrap();

        let hits = svc.search("q", None).await;

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content.len(), 1000);
        assert_eq!(hits[0].score, 0.5);
    }

    #[tokio::test]
    async fn empty_corpus_yields_empty_results() {
        let svc = service_with_scorer(Box::new(UniformScorer::default())).await;
        let hits = svc.search("q", None).await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_appends_a_history_row() {
        let svc = service_with_scorer(Box::new(UniformScorer::default())).await;
        seed(&svc, "physics", "body").await;

        svc.search("gravity", None).await;

        let recent = svc
            .storage
            .recent_searches(5)
            .await
            .expect("recent searches");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].query, "gravity");
    }

    #[test]
    fn uniform_scorer_is_deterministic() {
        let scorer = UniformScorer::default();
        let now = Utc::now();
        let a = scorer.score("q", "content", now, None);
        let b = scorer.score("q", "content", now, None);
        assert_eq!(a, b);
        assert_eq!(a, 0.5);
    }
}
