//! Allowlist data model.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A client's allowlist entry as submitted to the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientPatternSpec {
    pub client_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,

    pub patterns: Vec<String>,
}

/// One client's patterns under a single host bucket.
///
/// `login_url` and `patterns` are stored relative to the bucket's host key
/// when they share its prefix, absolute otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledClientEntry {
    pub client_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,

    #[serde(default)]
    pub patterns: Vec<String>,
}

impl CompiledClientEntry {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            login_url: None,
            patterns: Vec::new(),
        }
    }
}

/// Host-indexed allowlist: `scheme://host[:port]` → client entries.
///
/// Hosts and the entries inside each bucket keep insertion order; matching
/// is first-match over that order. Serializes as a JSON object.
#[derive(Debug, Clone, Default)]
pub struct CompiledAllowlist {
    buckets: Vec<(String, Vec<CompiledClientEntry>)>,
    index: HashMap<String, usize>,
}

impl CompiledAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries registered under `host_key`, in insertion order.
    pub fn bucket(&self, host_key: &str) -> Option<&[CompiledClientEntry]> {
        self.index
            .get(host_key)
            .map(|&i| self.buckets[i].1.as_slice())
    }

    /// Bucket for `host_key`, created empty if missing.
    pub fn bucket_mut(&mut self, host_key: &str) -> &mut Vec<CompiledClientEntry> {
        let i = match self.index.get(host_key) {
            Some(&i) => i,
            None => {
                self.buckets.push((host_key.to_string(), Vec::new()));
                let i = self.buckets.len() - 1;
                self.index.insert(host_key.to_string(), i);
                i
            }
        };
        &mut self.buckets[i].1
    }

    /// Iterate `(host_key, entries)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CompiledClientEntry])> {
        self.buckets
            .iter()
            .map(|(host, entries)| (host.as_str(), entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl PartialEq for CompiledAllowlist {
    fn eq(&self, other: &Self) -> bool {
        self.buckets == other.buckets
    }
}

impl Eq for CompiledAllowlist {}

impl Serialize for CompiledAllowlist {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (host, entries) in &self.buckets {
            map.serialize_entry(host, entries)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CompiledAllowlist {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AllowlistVisitor;

        impl<'de> Visitor<'de> for AllowlistVisitor {
            type Value = CompiledAllowlist;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of host keys to client entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut allowlist = CompiledAllowlist::new();
                while let Some((host, entries)) =
                    access.next_entry::<String, Vec<CompiledClientEntry>>()?
                {
                    allowlist.bucket_mut(&host).extend(entries);
                }
                Ok(allowlist)
            }
        }

        deserializer.deserialize_map(AllowlistVisitor)
    }
}

/// The persisted document: compiled allowlist plus the tenant error page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowlistDocument {
    #[serde(default)]
    pub host_to_pattern: CompiledAllowlist,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_page: Option<String>,
}

/// Outcome of a successful state match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub domain: String,
    pub client_name: String,
    /// Absolute pattern, with its `*` when it was a wildcard.
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlist_preserves_host_order() {
        let json = r#"{"https://b.com":[{"clientName":"b","patterns":[""]}],"https://a.com":[{"clientName":"a","loginUrl":"/login","patterns":["/x*"]}]}"#;
        let allowlist: CompiledAllowlist = serde_json::from_str(json).unwrap();

        let hosts: Vec<&str> = allowlist.iter().map(|(h, _)| h).collect();
        assert_eq!(hosts, vec!["https://b.com", "https://a.com"]);
        assert_eq!(allowlist.bucket("https://a.com").unwrap()[0].login_url.as_deref(), Some("/login"));

        assert_eq!(serde_json::to_string(&allowlist).unwrap(), json);
    }

    #[test]
    fn test_document_shape() {
        let doc: AllowlistDocument = serde_json::from_str(r#"{"errorPage":"https://error.page"}"#).unwrap();
        assert!(doc.host_to_pattern.is_empty());
        assert_eq!(doc.error_page.as_deref(), Some("https://error.page"));

        let value = serde_json::to_value(AllowlistDocument::default()).unwrap();
        assert_eq!(value, serde_json::json!({ "hostToPattern": {} }));
    }

    #[test]
    fn test_spec_rejects_unknown_fields() {
        let result = serde_json::from_str::<ClientPatternSpec>(
            r#"{"clientName":"c","patterns":["https://a.com"],"extra":1}"#,
        );
        assert!(result.is_err());
    }
}
