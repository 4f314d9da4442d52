//! Post resolver - fetches posts and normalizes raw documents into [`Post`]

use serde_json::Value;

use super::{Banner, ContentSection, Post, PostData, RichTextBlock};
use crate::error::ContentError;
use crate::prismic::query::FIRST_PUBLICATION_DATE;
use crate::prismic::{ContentSource, Direction, Document, PreviewToken, Query};

/// Page size used when enumerating every post
const LIST_PAGE_SIZE: u32 = 100;

/// Resolves posts of one document type
pub struct PostResolver<'a> {
    source: &'a dyn ContentSource,
    doc_type: &'a str,
}

impl<'a> PostResolver<'a> {
    pub fn new(source: &'a dyn ContentSource, doc_type: &'a str) -> Self {
        Self { source, doc_type }
    }

    /// List the slugs of every post, for static path enumeration
    pub async fn list_slugs(&self) -> Result<Vec<String>, ContentError> {
        let documents = self.fetch_all(Query::by_type(self.doc_type)).await?;

        Ok(documents
            .into_iter()
            .filter_map(|doc| {
                if doc.uid.is_none() {
                    tracing::warn!("Skipping document {} without uid", doc.id);
                }
                doc.uid
            })
            .collect())
    }

    /// Fetch one post by slug, against the draft ref when previewing
    pub async fn resolve_by_slug(
        &self,
        slug: &str,
        preview: Option<&PreviewToken>,
    ) -> Result<Post, ContentError> {
        let document = self
            .source
            .get_by_uid(self.doc_type, slug, preview)
            .await?
            .ok_or_else(|| ContentError::NotFound {
                doc_type: self.doc_type.to_string(),
                uid: slug.to_string(),
            })?;

        normalize_post(document)
    }

    /// All posts, newest first
    pub async fn list_posts(&self) -> Result<Vec<Post>, ContentError> {
        let query =
            Query::by_type(self.doc_type).order_by(FIRST_PUBLICATION_DATE, Direction::Desc);
        let documents = self.fetch_all(query).await?;

        let mut posts = Vec::with_capacity(documents.len());
        for document in documents {
            match normalize_post(document) {
                Ok(post) => posts.push(post),
                Err(e) => tracing::warn!("Skipping post: {}", e),
            }
        }
        Ok(posts)
    }

    async fn fetch_all(&self, query: Query) -> Result<Vec<Document>, ContentError> {
        let mut documents = Vec::new();
        let mut page = 1;

        loop {
            let response = self
                .source
                .query(&query.clone().page_size(LIST_PAGE_SIZE).page(page), None)
                .await?;
            let exhausted = response.next_page.is_none()
                || response.results.is_empty()
                || (response.total_pages > 0 && page >= response.total_pages);
            documents.extend(response.results);

            if exhausted {
                break;
            }
            page += 1;
        }

        Ok(documents)
    }
}

/// Convert a raw document into a [`Post`]
///
/// Text fields accept either a plain string or a rich-text array. Missing
/// fields default to empty values; shapes that cannot be read are rejected.
pub fn normalize_post(document: Document) -> Result<Post, ContentError> {
    let uid = document
        .uid
        .ok_or_else(|| ContentError::Malformed(format!("document {} has no uid", document.id)))?;
    let data = &document.data;

    let banner = Banner {
        url: data
            .get("banner")
            .and_then(|b| b.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };

    let content = match data.get("content") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(sections)) => sections
            .iter()
            .map(normalize_section)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(ContentError::Malformed(format!(
                "post {}: content is not a list",
                uid
            )))
        }
    };

    let post_data = PostData {
        title: text_field(data.get("title")),
        subtitle: text_field(data.get("subtitle")),
        author: text_field(data.get("author")),
        banner,
        content,
    };

    Ok(Post {
        uid,
        id: document.id,
        first_publication_date: document.first_publication_date,
        last_publication_date: document.last_publication_date,
        data: post_data,
    })
}

fn normalize_section(section: &Value) -> Result<ContentSection, ContentError> {
    let fields = section
        .as_object()
        .ok_or_else(|| ContentError::Malformed("content section is not an object".to_string()))?;

    // Older documents spell the field `headling`
    let heading = text_field(fields.get("heading").or_else(|| fields.get("headling")));

    let body = match fields.get("body") {
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter(|b| b.is_object())
            .cloned()
            .map(RichTextBlock::new)
            .collect(),
        _ => Vec::new(),
    };

    Ok(ContentSection { heading, body })
}

/// Read a Key Text or rich-text field as plain text
pub(crate) fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}
