//! HTTP clients for the upstream knowledge sources.
//!
//! This crate provides:
//! - [`SectorApi`] — authoritative content refresh for a sector
//! - [`AcademicApi`] — supplementary academic-resource feed
//!
//! Both use bounded timeouts so the retrieval pipeline never blocks
//! indefinitely on an upstream call.

mod academic;
mod refresh;

use std::time::Duration;

use reqwest::Client;
use sectorwise_shared::{Result, SectorwiseError};

pub use academic::AcademicApi;
pub use refresh::SectorApi;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for upstream requests.
const USER_AGENT: &str = concat!("sectorwise/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with a bounded, configuration-supplied timeout.
fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SectorwiseError::Transport(format!("failed to build HTTP client: {e}")))
}
