//! HTTP client for TheSportsDB, used exclusively for soccer team discovery.
//!
//! Its own circuit breaker, independent of the ESPN clients, so an outage on
//! the secondary provider never gates the primary.

use crate::circuit_breaker::CircuitBreaker;
use crate::error::{Result, TeamarrError};
use crate::retry::{execute_with_retry, is_retriable_status, is_retriable_transport_error};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const DEFAULT_BASE: &str = "https://www.thesportsdb.com/api/v1/json/3";

#[derive(Debug, Clone)]
pub struct TsdbTeamDoc {
    pub name: String,
    /// The primary provider's team id, taken from TSDB's explicit cross-reference
    /// field. This is the only sanctioned cross-provider ID coalescing point.
    pub espn_id: Option<String>,
}

#[derive(Clone)]
pub struct TsdbClient {
    client: Client,
    base: String,
    breaker: Arc<CircuitBreaker>,
}

impl std::fmt::Debug for TsdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsdbClient")
            .field("circuit_state", &self.breaker.state())
            .finish()
    }
}

impl TsdbClient {
    pub fn new(http_timeout_secs: u64) -> Self {
        Self::with_base_url(DEFAULT_BASE, http_timeout_secs)
    }

    pub fn with_base_url(base: &str, http_timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(http_timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base: base.trim_end_matches('/').to_string(),
            breaker: Arc::new(CircuitBreaker::with_defaults("thesportsdb")),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_tsdb_team_by_name(&self, name: &str) -> Result<Option<TsdbTeamDoc>> {
        if !self.breaker.is_available() {
            return Err(TeamarrError::upstream_unavailable("tsdb_searchteams", "circuit open"));
        }

        let url = format!("{}/searchteams.php?t={}", self.base, urlencode(name));
        let client = &self.client;
        let result: std::result::Result<Value, reqwest::Error> = execute_with_retry(
            "tsdb_searchteams",
            || async {
                let resp = client.get(&url).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(resp.error_for_status().unwrap_err());
                }
                resp.json::<Value>().await
            },
            |err| {
                is_retriable_transport_error(err)
                    || err.status().map(is_retriable_status).unwrap_or(false)
            },
        )
        .await;

        let data = match result {
            Ok(v) => {
                self.breaker.record_success();
                v
            }
            Err(err) => {
                self.breaker.record_failure();
                return Err(TeamarrError::upstream_unavailable("tsdb_searchteams", err.to_string()));
            }
        };

        let team = data
            .get("teams")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first());

        Ok(team.map(|t| TsdbTeamDoc {
            name: t.get("strTeam").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            espn_id: t
                .get("idESPN")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
        }))
    }
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c.to_string()
            } else if c == ' ' {
                "+".to_string()
            } else {
                format!("%{:02X}", c as u32)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_team_by_name_with_espn_cross_reference() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/searchteams.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "teams": [{"strTeam": "Tottenham Hotspur", "idESPN": "367"}]
            })))
            .mount(&server)
            .await;

        let client = TsdbClient::with_base_url(&server.uri(), 5);
        let doc = client.fetch_tsdb_team_by_name("Tottenham Hotspur").await.unwrap().unwrap();
        assert_eq!(doc.espn_id, Some("367".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_team_by_name_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/searchteams.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"teams": null})))
            .mount(&server)
            .await;

        let client = TsdbClient::with_base_url(&server.uri(), 5);
        let doc = client.fetch_tsdb_team_by_name("Nonexistent FC").await.unwrap();
        assert!(doc.is_none());
    }
}
