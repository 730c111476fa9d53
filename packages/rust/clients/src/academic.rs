//! Academic-resources client: fetches supplementary summaries for a sector.

use reqwest::Client;
use sectorwise_shared::{AcademicResource, Result, SectorwiseError};
use tracing::{debug, instrument};
use url::Url;

/// Client for the secondary academic-resource feed.
///
/// The endpoint is queried as `GET <endpoint>?sector=<sector>` and must
/// return a JSON array of objects each carrying a `summary` field.
pub struct AcademicApi {
    client: Client,
    endpoint: Url,
}

impl AcademicApi {
    /// Create a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: Url, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: crate::build_client(timeout_secs)?,
            endpoint,
        })
    }

    /// Fetch the academic resources for `sector`, in feed order.
    #[instrument(skip_all, fields(sector = %sector))]
    pub async fn fetch(&self, sector: &str) -> Result<Vec<AcademicResource>> {
        debug!(endpoint = %self.endpoint, "fetching academic resources");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("sector", sector)])
            .send()
            .await
            .map_err(|e| SectorwiseError::Transport(format!("{sector}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SectorwiseError::Transport(format!(
                "{sector}: HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SectorwiseError::Transport(format!("{sector}: body read failed: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| SectorwiseError::malformed(format!("{sector}: {e}")))
    }
}
