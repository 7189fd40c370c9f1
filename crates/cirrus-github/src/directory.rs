//! Cached, searchable view of an organization's runners.

use std::time::Duration;

use regex::RegexBuilder;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::cache::TtlCache;
use crate::client::{Runner, RunnerClient};
use crate::error::{GithubError, Result};

/// Result of a runner search. Never an error: every failure is a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RunnerListing {
    /// No token is configured; carries the reason.
    Unconfigured(String),
    /// The listing could not be fetched or the pattern is invalid.
    Failed(String),
    /// The organization has no runners at all.
    Empty,
    /// Summary lines of the runners matching the pattern (possibly none).
    Runners(Vec<String>),
}

enum Source {
    Client(RunnerClient),
    Unconfigured(String),
}

/// Searches runners, refetching the full listing at most once per TTL.
pub struct RunnerDirectory {
    source: Source,
    cache: Mutex<TtlCache<Vec<Runner>>>,
}

impl RunnerDirectory {
    pub fn new(client: RunnerClient, ttl: Duration) -> Self {
        Self {
            source: Source::Client(client),
            cache: Mutex::new(TtlCache::new(ttl)),
        }
    }

    /// A directory that answers every search with [`RunnerListing::Unconfigured`].
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            source: Source::Unconfigured(reason.into()),
            cache: Mutex::new(TtlCache::new(Duration::ZERO)),
        }
    }

    /// Drop the cached listing.
    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }

    /// Runners whose JSON record matches `pattern`, case-insensitively.
    pub async fn search(&self, pattern: &str) -> RunnerListing {
        let client = match &self.source {
            Source::Client(client) => client,
            Source::Unconfigured(reason) => return RunnerListing::Unconfigured(reason.clone()),
        };

        let matcher = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(matcher) => matcher,
            Err(e) => return RunnerListing::Failed(GithubError::from(e).to_string()),
        };

        let runners = match self.runners(client).await {
            Ok(runners) => runners,
            Err(e) => {
                tracing::warn!(org = client.org(), error = %e, "Runner listing failed");
                return RunnerListing::Failed(e.to_string());
            }
        };

        if runners.is_empty() {
            return RunnerListing::Empty;
        }

        RunnerListing::Runners(
            runners
                .iter()
                .filter(|runner| {
                    serde_json::to_string(runner).is_ok_and(|json| matcher.is_match(&json))
                })
                .map(Runner::summary)
                .collect(),
        )
    }

    /// The cached listing, refetched when stale. Failures are not cached.
    async fn runners(&self, client: &RunnerClient) -> Result<Vec<Runner>> {
        let mut cache = self.cache.lock().await;
        if let Some(runners) = cache.get() {
            return Ok(runners.clone());
        }

        let runners = client.list_all().await?;
        cache.insert(runners.clone());
        Ok(runners)
    }
}
