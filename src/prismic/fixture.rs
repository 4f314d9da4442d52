//! Offline content source backed by a JSON export
//!
//! Evaluates queries locally so the site can be generated without network
//! access. The file holds either a plain array of documents or a search
//! response object with a `results` array.

use async_trait::async_trait;
use std::cmp::Ordering as CmpOrdering;
use std::fs;
use std::path::Path;

use super::query::{DOCUMENT_ID, DOCUMENT_TYPE, FIRST_PUBLICATION_DATE, LAST_PUBLICATION_DATE};
use super::{
    ContentSource, Direction, Document, Ordering, Predicate, PreviewToken, Query, SearchResponse,
};
use crate::error::ContentError;

/// Default page size, same as the live API
const DEFAULT_PAGE_SIZE: u32 = 20;

/// In-memory document store
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    documents: Vec<Document>,
}

impl FixtureSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load documents from a JSON export
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ContentError> {
        let content = fs::read_to_string(path.as_ref())?;
        let value: serde_json::Value = serde_json::from_str(&content)?;

        let documents: Vec<Document> = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)?,
            serde_json::Value::Object(mut map) => match map.remove("results") {
                Some(results) => serde_json::from_value(results)?,
                None => {
                    return Err(ContentError::Malformed(
                        "export object has no `results` array".to_string(),
                    ))
                }
            },
            _ => {
                return Err(ContentError::Malformed(
                    "export must be an array or an object".to_string(),
                ))
            }
        };

        tracing::debug!("Loaded {} documents from {:?}", documents.len(), path.as_ref());
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn run(&self, query: &Query) -> SearchResponse {
        let mut matched: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| query.predicates.iter().all(|p| matches(doc, p)))
            .collect();

        matched.sort_by(|a, b| compare(a, b, &query.orderings));

        if let Some(after) = &query.after {
            matched = match matched.iter().position(|doc| &doc.id == after) {
                Some(pos) => matched.split_off(pos + 1),
                None => Vec::new(),
            };
        }

        let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let page = query.page.unwrap_or(1).max(1);
        let total = matched.len() as u32;
        let total_pages = total.div_ceil(page_size);

        let results: Vec<Document> = matched
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .cloned()
            .collect();

        let next_page = (page < total_pages).then(|| format!("page={}", page + 1));

        SearchResponse {
            page,
            results_per_page: results.len() as u32,
            total_results_size: total,
            total_pages,
            next_page,
            results,
        }
    }
}

#[async_trait]
impl ContentSource for FixtureSource {
    async fn query(
        &self,
        query: &Query,
        _preview: Option<&PreviewToken>,
    ) -> Result<SearchResponse, ContentError> {
        Ok(self.run(query))
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    let Predicate::At { path, value } = predicate;

    match path.as_str() {
        DOCUMENT_TYPE => &doc.doc_type == value,
        DOCUMENT_ID => &doc.id == value,
        "document.tags" => doc.tags.iter().any(|t| t == value),
        _ => match path.strip_prefix("my.").and_then(|rest| rest.split_once('.')) {
            Some((doc_type, "uid")) => {
                doc.doc_type == doc_type && doc.uid.as_deref() == Some(value.as_str())
            }
            Some((doc_type, field)) => {
                doc.doc_type == doc_type
                    && doc.data.get(field).and_then(|v| v.as_str()) == Some(value.as_str())
            }
            None => false,
        },
    }
}

fn compare(a: &Document, b: &Document, orderings: &[Ordering]) -> CmpOrdering {
    for ordering in orderings {
        let ord = match ordering.field.as_str() {
            FIRST_PUBLICATION_DATE => a.first_publication_date.cmp(&b.first_publication_date),
            LAST_PUBLICATION_DATE => a.last_publication_date.cmp(&b.last_publication_date),
            DOCUMENT_ID => a.id.cmp(&b.id),
            field => {
                let key = field.rsplit('.').next().unwrap_or(field);
                let left = a.data.get(key).and_then(|v| v.as_str());
                let right = b.data.get(key).and_then(|v| v.as_str());
                left.cmp(&right)
            }
        };
        let ord = match ordering.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != CmpOrdering::Equal {
            return ord;
        }
    }
    a.id.cmp(&b.id)
}
