//! Raw document shapes returned by the content API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A CMS document as returned by the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_publication_date: Option<DateTime<Utc>>,

    /// Schemaless document fields, normalized by the resolvers
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One page of search results
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default = "first_page")]
    pub page: u32,

    #[serde(default)]
    pub results_per_page: u32,

    #[serde(default)]
    pub total_results_size: u32,

    #[serde(default)]
    pub total_pages: u32,

    #[serde(default)]
    pub next_page: Option<String>,

    #[serde(default)]
    pub results: Vec<Document>,
}

fn first_page() -> u32 {
    1
}

/// Repository description returned by the API root
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRoot {
    #[serde(default)]
    pub refs: Vec<Ref>,
}

/// A content version
#[derive(Debug, Clone, Deserialize)]
pub struct Ref {
    pub id: String,

    #[serde(rename = "ref")]
    pub reference: String,

    #[serde(default)]
    pub label: String,

    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiRoot {
    /// The ref serving published content
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// Parse a CMS timestamp
///
/// Accepts RFC 3339 (`2021-03-05T10:05:00Z`) as well as the
/// `2021-03-05T10:05:00+0000` form used by the API.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
    }
}
