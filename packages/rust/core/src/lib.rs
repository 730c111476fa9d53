//! Core retrieval pipeline and ranking logic for sectorwise.
//!
//! This crate ties the topic store, TTL cache, and upstream clients into
//! the staleness-aware content-retrieval flow (`topic_content`) and the
//! ranked search over the topic corpus (`search`).

pub mod freshness;
pub mod retrieval;
pub mod search;

pub use freshness::FreshnessPolicy;
pub use retrieval::{
    AcademicFetcher, Answerer, NO_INFORMATION_ANSWER, RefreshFetcher, RetrievalService,
    ServiceConfig, TemplateAnswerer, TopicAnswer,
};
pub use search::{RelevanceScorer, UniformScorer};
