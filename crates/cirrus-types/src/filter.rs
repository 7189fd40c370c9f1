//! Instance directory filters.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Criteria for a directory query.
///
/// Only running instances are ever returned; that restriction is applied by
/// the directory and cannot be relaxed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFilter {
    /// Instance types to match (any of). Empty means no type restriction.
    pub instance_types: Vec<String>,
    /// Prefix of the `Name` tag.
    pub name_prefix: Option<String>,
    /// Tags that must all match exactly.
    pub tags: BTreeMap<String, String>,
    /// Drop instances the remote-execution agent cannot reach.
    pub reachable_only: bool,
}

impl Default for InstanceFilter {
    fn default() -> Self {
        Self {
            instance_types: Vec::new(),
            name_prefix: None,
            tags: BTreeMap::new(),
            reachable_only: true,
        }
    }
}

impl InstanceFilter {
    /// Create a filter matching every reachable running instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given instance types.
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instance_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to names starting with `prefix`.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Require a tag value. Repeated calls narrow the result.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Include instances regardless of reachability.
    pub fn include_unreachable(mut self) -> Self {
        self.reachable_only = false;
        self
    }
}

/// Parse a `KEY=VALUE` tag filter. The value may itself contain `=`.
pub fn parse_tag(input: &str) -> Result<(String, String)> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::InvalidTag(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reachable_only() {
        let filter = InstanceFilter::default();
        assert!(filter.reachable_only);
        assert!(filter.instance_types.is_empty());
        assert!(filter.name_prefix.is_none());
        assert!(filter.tags.is_empty());
    }

    #[test]
    fn test_builder() {
        let filter = InstanceFilter::new()
            .with_types(["t2.micro", "t3.small"])
            .with_name_prefix("web")
            .with_tag("env", "prod")
            .with_tag("team", "infra")
            .include_unreachable();
        assert_eq!(filter.instance_types, vec!["t2.micro", "t3.small"]);
        assert_eq!(filter.name_prefix.as_deref(), Some("web"));
        assert_eq!(filter.tags.len(), 2);
        assert!(!filter.reachable_only);
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(
            parse_tag("env=prod").unwrap(),
            ("env".to_string(), "prod".to_string())
        );
        assert_eq!(
            parse_tag("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_tag("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=value").is_err());
    }
}
