//! API event lookup and log search over time windows.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{CloudError, Result};
use crate::provider::{AuditTrail, EventPage, LogFilterRequest, LogStream, LookupRequest};

/// Events returned per lookup when the caller gives no limit.
pub const DEFAULT_MAX_EVENTS: u32 = 50;

/// Span covered by a window with no explicit bounds.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

// ─────────────────────────────────────────────────────────────────────────────
// Time Window
// ─────────────────────────────────────────────────────────────────────────────

/// A time range in epoch milliseconds, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    /// Create a window. Fails if `start_ms` is after `end_ms`.
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self> {
        if start_ms > end_ms {
            return Err(CloudError::InvalidRequest(format!(
                "time window starts after it ends ({start_ms} > {end_ms})"
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    /// The `hours` leading up to `now`.
    pub fn last_hours(now: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start_ms: (now - Duration::hours(hours)).timestamp_millis(),
            end_ms: now.timestamp_millis(),
        }
    }

    /// Window from optional bounds. The end defaults to now and the start
    /// to [`DEFAULT_WINDOW_HOURS`] before the end.
    pub fn from_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        let end = end.unwrap_or_else(Utc::now);
        let start = start.unwrap_or(end - Duration::hours(DEFAULT_WINDOW_HOURS));
        Self::new(start.timestamp_millis(), end.timestamp_millis())
    }

    /// Window from optional timestamp strings (see [`parse_time`]).
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = start.map(parse_time).transpose()?;
        let end = end.map(parse_time).transpose()?;
        Self::from_bounds(start, end)
    }

    /// Returns true if `timestamp_ms` lies inside the window, bounds included.
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        self.start_ms <= timestamp_ms && timestamp_ms <= self.end_ms
    }
}

/// Parse an RFC 3339 timestamp, or a zone-less `YYYY-MM-DDTHH:MM:SS` taken as UTC.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| CloudError::InvalidRequest(format!("invalid timestamp '{value}'")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Query
// ─────────────────────────────────────────────────────────────────────────────

/// Criteria for an API event lookup.
///
/// Only the resource name is sent to the provider, which accepts a single
/// lookup attribute. Type and event-name filters are applied to the returned
/// page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub resource_name: String,
    pub resource_type: Option<String>,
    pub event_name: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub max_results: u32,
}

impl EventQuery {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            resource_type: None,
            event_name: None,
            start: None,
            end: None,
            max_results: DEFAULT_MAX_EVENTS,
        }
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_event_name(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = Some(event_name.into());
        self
    }

    pub fn with_start(mut self, start: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self
    }

    pub fn with_end(mut self, end: Option<DateTime<Utc>>) -> Self {
        self.end = end;
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Audit Log
// ─────────────────────────────────────────────────────────────────────────────

/// Event lookup and log search.
#[derive(Clone)]
pub struct AuditLog {
    trail: Arc<dyn AuditTrail>,
}

impl AuditLog {
    pub fn new(trail: Arc<dyn AuditTrail>) -> Self {
        Self { trail }
    }

    /// Look up API events touching a resource.
    pub async fn lookup_events(&self, query: &EventQuery) -> Result<EventPage> {
        let request = LookupRequest {
            attribute_key: "ResourceName".to_string(),
            attribute_value: query.resource_name.clone(),
            start: query.start,
            end: query.end,
            max_results: query.max_results,
        };

        let mut page = self.trail.lookup_events(&request).await?;
        page.events.retain(|event| {
            let name_ok = query
                .event_name
                .as_ref()
                .is_none_or(|wanted| event.event_name.as_ref() == Some(wanted));
            let type_ok = query.resource_type.as_ref().is_none_or(|wanted| {
                event
                    .resources
                    .iter()
                    .any(|r| r.resource_type.as_ref() == Some(wanted))
            });
            name_ok && type_ok
        });

        tracing::debug!(
            resource = %query.resource_name,
            count = page.events.len(),
            "Looked up events"
        );
        Ok(page)
    }

    /// Streams per group whose last event lies inside `window`.
    ///
    /// A missing group maps to an empty list; other failures propagate.
    pub async fn list_log_streams(
        &self,
        groups: &[String],
        window: TimeWindow,
    ) -> Result<BTreeMap<String, Vec<LogStream>>> {
        let mut result = BTreeMap::new();
        for group in groups {
            let streams = match self.trail.list_log_streams(group).await {
                Ok(streams) => streams
                    .into_iter()
                    .filter(|s| s.last_event_timestamp.is_some_and(|t| window.contains(t)))
                    .collect(),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(group = %group, "Log group not found");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
            result.insert(group.clone(), streams);
        }
        Ok(result)
    }

    /// Messages per group matching `pattern` inside `window`.
    ///
    /// Groups that fail are logged and skipped; groups without matches are
    /// omitted. An empty `stream_names` searches every stream.
    pub async fn search_logs(
        &self,
        pattern: &str,
        groups: &[String],
        window: TimeWindow,
        stream_names: &[String],
    ) -> BTreeMap<String, Vec<String>> {
        let mut result = BTreeMap::new();
        for group in groups {
            let request = LogFilterRequest {
                group: group.clone(),
                pattern: format!("%{pattern}%"),
                start_ms: window.start_ms,
                end_ms: window.end_ms,
                stream_names: stream_names.to_vec(),
            };

            match self.trail.filter_log_events(&request).await {
                Ok(events) => {
                    let messages: Vec<String> = events
                        .into_iter()
                        .filter(|e| window.contains(e.timestamp))
                        .map(|e| e.message)
                        .collect();
                    if !messages.is_empty() {
                        result.insert(group.clone(), messages);
                    }
                }
                Err(e) => {
                    tracing::warn!(group = %group, error = %e, "Error querying log group");
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::mock::MockCloud;
    use crate::provider::{AuditEvent, EventResource, LogEvent};

    fn event(name: &str, resource_type: &str) -> AuditEvent {
        AuditEvent {
            event_id: Some(format!("evt-{name}")),
            event_name: Some(name.to_string()),
            event_time: None,
            username: Some("ops".to_string()),
            resources: vec![EventResource {
                resource_type: Some(resource_type.to_string()),
                resource_name: Some("i-1".to_string()),
            }],
        }
    }

    fn stream(name: &str, last: i64) -> LogStream {
        LogStream {
            name: name.to_string(),
            last_event_timestamp: Some(last),
        }
    }

    fn log_event(timestamp: i64, message: &str) -> LogEvent {
        LogEvent {
            stream: None,
            timestamp,
            message: message.to_string(),
        }
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_window_is_inclusive() {
        let window = TimeWindow::new(100, 200).unwrap();
        assert!(window.contains(100));
        assert!(window.contains(200));
        assert!(!window.contains(99));
        assert!(!window.contains(201));
        assert!(TimeWindow::new(201, 200).is_err());
    }

    #[test]
    fn test_window_defaults_to_last_day() {
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let window = TimeWindow::from_bounds(None, Some(end)).unwrap();
        assert_eq!(window.end_ms - window.start_ms, 24 * 3600 * 1000);
        assert_eq!(window, TimeWindow::last_hours(end, 24));
    }

    #[test]
    fn test_parse_time_formats() {
        let zulu = parse_time("2024-03-01T00:00:00Z").unwrap();
        let naive = parse_time("2024-03-01T00:00:00").unwrap();
        assert_eq!(zulu, naive);
        assert!(parse_time("March 1st").is_err());

        let window = TimeWindow::parse(Some("2024-03-01T00:00:00Z"), Some("2024-03-01T01:00:00Z"))
            .unwrap();
        assert_eq!(window.end_ms - window.start_ms, 3600 * 1000);
    }

    #[tokio::test]
    async fn test_lookup_sends_only_resource_name() {
        let cloud = Arc::new(MockCloud::new().with_events(vec![
            event("RunInstances", "AWS::EC2::Instance"),
            event("StopInstances", "AWS::EC2::Instance"),
            event("PutObject", "AWS::S3::Object"),
        ]));
        let audit = AuditLog::new(cloud.clone());

        let query = EventQuery::new("i-1")
            .with_resource_type("AWS::EC2::Instance")
            .with_event_name("StopInstances");
        let page = audit.lookup_events(&query).await.unwrap();

        assert_eq!(page.events.len(), 1);
        assert_eq!(page.events[0].event_name.as_deref(), Some("StopInstances"));

        let lookups = cloud.lookups();
        assert_eq!(lookups.len(), 1);
        assert_eq!(lookups[0].attribute_key, "ResourceName");
        assert_eq!(lookups[0].attribute_value, "i-1");
        assert_eq!(lookups[0].max_results, DEFAULT_MAX_EVENTS);
    }

    #[tokio::test]
    async fn test_list_log_streams_filters_by_window() {
        let cloud = Arc::new(
            MockCloud::new()
                .with_log_streams(
                    "/app",
                    vec![stream("late", 300), stream("edge", 200), stream("old", 50)],
                )
                .with_missing_log_group("/gone"),
        );
        let audit = AuditLog::new(cloud.clone());

        let window = TimeWindow::new(100, 200).unwrap();
        let result = audit
            .list_log_streams(&groups(&["/app", "/gone"]), window)
            .await
            .unwrap();

        let names: Vec<_> = result["/app"].iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["edge"]);
        assert!(result["/gone"].is_empty());
    }

    #[tokio::test]
    async fn test_search_logs_skips_failures_and_empty_groups() {
        let cloud = Arc::new(
            MockCloud::new()
                .with_log_events(
                    "/app",
                    vec![log_event(150, "scale-up ok"), log_event(500, "too late")],
                )
                .with_log_events("/quiet", vec![])
                .with_failing_log_group("/broken"),
        );
        let audit = AuditLog::new(cloud.clone());

        let window = TimeWindow::new(100, 200).unwrap();
        let result = audit
            .search_logs(
                "scale",
                &groups(&["/app", "/quiet", "/broken"]),
                window,
                &[],
            )
            .await;

        assert_eq!(result.len(), 1);
        assert_eq!(result["/app"], vec!["scale-up ok"]);
        let requests = cloud.log_filters();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].pattern, "%scale%");
    }
}
