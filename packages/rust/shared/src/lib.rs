//! Shared types, error model, and configuration for sectorwise.
//!
//! This crate is the foundation depended on by all other sectorwise crates.
//! It provides:
//! - [`SectorwiseError`] — the unified error type
//! - Domain types ([`Topic`], [`SectorPayload`], [`AcademicResource`], [`SearchHit`])
//! - Configuration ([`AppConfig`], config loading, source resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ACADEMIC_URL_ENV, API_URL_ENV, AppConfig, DefaultsConfig, ResolvedSources,
    RetrievalPolicyConfig, SourcesConfig, config_dir, config_file_path, expand_path, init_config,
    load_config, load_config_from, resolve_sources,
};
pub use error::{Result, SectorwiseError};
pub use types::{AcademicResource, SearchHit, SearchRecord, SectorPayload, Topic, UserProgress};
