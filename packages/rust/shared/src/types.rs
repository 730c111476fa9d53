//! Core domain types for the sectorwise topic corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// A stored knowledge topic, keyed by its sector name.
///
/// The sector is a case-sensitive unique key. Absence of a Topic for a
/// sector is a valid state ("unknown sector"), not an error. Topics are
/// created on the first successful refresh and overwritten on every later
/// one; this core never deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Sector name (unique, case-sensitive key).
    pub sector: String,
    /// Authoritative knowledge body.
    pub content: String,
    /// Optional further-reading link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub further_reading: Option<String>,
    /// When the content was last refreshed from upstream.
    pub last_update: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// Response document from the external refresh source for one sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorPayload {
    /// Replacement content body.
    pub content: String,
    /// Optional further-reading link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub further_reading: Option<String>,
}

/// One item from the academic-resources feed.
///
/// Only `summary` is required; unknown upstream fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicResource {
    /// Summary text appended to the answer context.
    pub summary: String,
    /// Resource title, if the feed provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Link to the resource, if the feed provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// A single ranked search result. Transient, never persisted.
///
/// Carries the full topic content; display snipping is the caller's job.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// Sector of the matching topic.
    pub sector: String,
    /// Full topic content.
    pub content: String,
    /// Relevance score (> 0 for every returned hit).
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Audit rows
// ---------------------------------------------------------------------------

/// A per-sector study-progress record. Pass-through storage, no behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    /// Row identifier (UUID v7).
    pub id: String,
    /// Sector the study session covered.
    pub sector: String,
    /// When the session happened.
    pub last_study_date: DateTime<Utc>,
    /// Performance score for the session.
    pub performance: f64,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A recorded search query. Pass-through storage, no behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Row identifier (UUID v7).
    pub id: String,
    /// The query as submitted.
    pub query: String,
    /// When the search ran.
    pub timestamp: DateTime<Utc>,
}
