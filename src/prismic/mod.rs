//! Content source adapter for the Prismic headless CMS
//!
//! The resolvers only see the [`ContentSource`] trait. The live API client
//! and the offline JSON export both implement it.

mod client;
mod document;
mod fixture;
pub mod query;

use async_trait::async_trait;

pub use client::PrismicClient;
pub use document::{parse_timestamp, ApiRoot, Document, Ref, SearchResponse};
pub use fixture::FixtureSource;
pub use query::{Direction, Ordering, Predicate, Query};

use crate::error::ContentError;

/// Opaque preview ref handed out by the CMS for draft content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewToken(String);

impl PreviewToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A queryable document store
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a query, against the draft ref when a preview token is given
    async fn query(
        &self,
        query: &Query,
        preview: Option<&PreviewToken>,
    ) -> Result<SearchResponse, ContentError>;

    /// Fetch a single document by its uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        preview: Option<&PreviewToken>,
    ) -> Result<Option<Document>, ContentError> {
        let query = Query::new(Predicate::uid(doc_type, uid)).page_size(1);
        let response = self.query(&query, preview).await?;
        Ok(response.results.into_iter().next())
    }
}
