//! Organization runner listing over the GitHub REST API.

use std::time::Duration;

use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use crate::error::{GithubError, Result};

/// Default timeout for requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Largest page size GitHub accepts.
const PER_PAGE: u32 = 100;

/// A self-hosted runner registered to the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runner {
    pub id: u64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub busy: bool,
    #[serde(default)]
    pub labels: Vec<RunnerLabel>,
    /// Every other field GitHub returned; kept so searches see the full record.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerLabel {
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Runner {
    /// One-line summary: `<id> <name> (<status>) <busy> <labels>`.
    ///
    /// The busy slot is empty for idle runners.
    pub fn summary(&self) -> String {
        let labels: Vec<&str> = self.labels.iter().map(|l| l.name.as_str()).collect();
        format!(
            "{} {} ({}) {} {}",
            self.id,
            self.name,
            self.status,
            if self.busy { "busy" } else { "" },
            labels.join(" ")
        )
    }
}

#[derive(Debug, Deserialize)]
struct RunnersPage {
    #[serde(default)]
    runners: Vec<Runner>,
}

/// Extract the `rel="next"` target from a `Link` header.
///
/// The header is a comma-separated list of `<url>; rel="name"` entries.
pub fn next_page_url(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let url = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;
        parts
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| url.to_string())
    })
}

/// Lists an organization's self-hosted runners.
pub struct RunnerClient {
    client: Client,
    api_base: String,
    org: String,
    token: String,
}

impl RunnerClient {
    pub fn new(
        api_base: impl Into<String>,
        org: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("cirrus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GithubError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            org: org.into(),
            token: token.into(),
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    fn first_page_url(&self) -> String {
        format!(
            "{}/orgs/{}/actions/runners?per_page={}",
            self.api_base.trim_end_matches('/'),
            self.org,
            PER_PAGE
        )
    }

    /// Fetch every runner, following `Link` pagination to the last page.
    pub async fn list_all(&self) -> Result<Vec<Runner>> {
        let mut runners = Vec::new();
        let mut next = Some(self.first_page_url());
        let mut pages = 0u32;

        while let Some(url) = next {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .header(header::ACCEPT, "application/vnd.github.v3+json")
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(GithubError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            next = response
                .headers()
                .get(header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);

            let body = response.text().await?;
            let page: RunnersPage =
                serde_json::from_str(&body).map_err(|e| GithubError::Parse(e.to_string()))?;
            runners.extend(page.runners);
            pages += 1;
        }

        tracing::debug!(org = %self.org, pages, runners = runners.len(), "Fetched runners");
        Ok(runners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runner(id: u64, name: &str, busy: bool) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": name,
            "os": "linux",
            "status": "online",
            "busy": busy,
            "labels": [
                { "id": 1, "name": "self-hosted", "type": "read-only" },
                { "id": 2, "name": "linux.2xlarge", "type": "custom" }
            ]
        })
    }

    #[test]
    fn test_next_page_url() {
        let header = r#"<https://api.github.com/orgs/o/actions/runners?per_page=100&page=2>; rel="next", <https://api.github.com/orgs/o/actions/runners?per_page=100&page=5>; rel="last""#;
        assert_eq!(
            next_page_url(header).as_deref(),
            Some("https://api.github.com/orgs/o/actions/runners?per_page=100&page=2")
        );

        let last_page = r#"<https://api.github.com/x?page=1>; rel="prev", <https://api.github.com/x?page=1>; rel="first""#;
        assert!(next_page_url(last_page).is_none());
        assert!(next_page_url("").is_none());
    }

    #[test]
    fn test_summary_line() {
        let busy: Runner = serde_json::from_value(runner(7, "i-0abc", true)).unwrap();
        assert_eq!(busy.summary(), "7 i-0abc (online) busy self-hosted linux.2xlarge");

        let idle: Runner = serde_json::from_value(runner(8, "i-0def", false)).unwrap();
        assert_eq!(idle.summary(), "8 i-0def (online)  self-hosted linux.2xlarge");
    }

    #[test]
    fn test_runner_keeps_unknown_fields() {
        let runner: Runner = serde_json::from_value(runner(1, "r", false)).unwrap();
        let json = serde_json::to_string(&runner).unwrap();
        assert!(json.contains("\"os\":\"linux\""));
        assert!(json.contains("\"type\":\"custom\""));
    }

    #[tokio::test]
    async fn test_list_all_follows_pagination() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/orgs/pytorch/actions/runners?per_page=100&page=2>; rel=\"next\"",
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/orgs/pytorch/actions/runners"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_count": 2,
                "runners": [runner(2, "second", true)]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/pytorch/actions/runners"))
            .and(query_param("per_page", "100"))
            .and(header("authorization", "Bearer ghp_test"))
            .and(header("accept", "application/vnd.github.v3+json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .set_body_json(serde_json::json!({
                        "total_count": 2,
                        "runners": [runner(1, "first", false)]
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RunnerClient::new(server.uri(), "pytorch", "ghp_test").unwrap();
        let runners = client.list_all().await.unwrap();

        let names: Vec<_> = runners.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let client = RunnerClient::new(server.uri(), "pytorch", "bad").unwrap();
        let err = client.list_all().await.unwrap_err();
        assert!(matches!(err, GithubError::Status { status: 401, .. }));
        assert!(err.to_string().contains("Bad credentials"));
    }
}
