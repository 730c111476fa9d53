//! External refresh client: fetches authoritative content for a sector.

use reqwest::Client;
use sectorwise_shared::{Result, SectorPayload, SectorwiseError};
use tracing::{debug, instrument};
use url::Url;

/// Client for the external content-refresh API.
///
/// The endpoint is queried as `GET <endpoint>?sector=<sector>` and must
/// return a JSON document with `content` and optional `further_reading`.
pub struct SectorApi {
    client: Client,
    endpoint: Url,
}

impl SectorApi {
    /// Create a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: Url, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: crate::build_client(timeout_secs)?,
            endpoint,
        })
    }

    /// Fetch the authoritative payload for `sector`.
    #[instrument(skip_all, fields(sector = %sector))]
    pub async fn fetch(&self, sector: &str) -> Result<SectorPayload> {
        debug!(endpoint = %self.endpoint, "fetching sector content");

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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api_for(server: &MockServer) -> SectorApi {
        let endpoint = Url::parse(&format!("{}/topics", server.uri())).unwrap();
        SectorApi::new(endpoint, 1).expect("build client")
    }

    #[tokio::test]
    async fn fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics"))
            .and(query_param("sector", "physics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"content": "Newton's laws...", "further_reading": "http://x"}"#,
            ))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let payload = api.fetch("physics").await.expect("fetch");
        assert_eq!(payload.content, "Newton's laws...");
        assert_eq!(payload.further_reading.as_deref(), Some("http://x"));
    }

    #[tokio::test]
    async fn non_success_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let err = api.fetch("physics").await.unwrap_err();
        assert!(matches!(err, SectorwiseError::Transport(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let err = api.fetch("physics").await.unwrap_err();
        assert!(matches!(err, SectorwiseError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn schema_mismatch_is_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"unexpected": "shape"}"#),
            )
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let err = api.fetch("physics").await.unwrap_err();
        assert!(matches!(err, SectorwiseError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn slow_upstream_times_out_as_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"content": "late"}"#)
                    .set_delay(std::time::Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        // 1 s client timeout against a 5 s upstream delay.
        let api = api_for(&server).await;
        let err = api.fetch("physics").await.unwrap_err();
        assert!(matches!(err, SectorwiseError::Transport(_)));
    }
}
