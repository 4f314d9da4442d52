//! Post view models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post, normalized from a CMS document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Routing slug
    pub uid: String,

    /// CMS-internal document id, used as the adjacency pivot
    pub id: String,

    /// First publication date (absent for never-published drafts)
    pub first_publication_date: Option<DateTime<Utc>>,

    /// Last publication date
    pub last_publication_date: Option<DateTime<Utc>>,

    pub data: PostData,
}

/// Post fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    /// Sections in display order
    pub content: Vec<ContentSection>,
}

/// Banner image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
}

/// A titled section of a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// An opaque structured-text node as produced by the CMS
///
/// Only its flattened text is read here; turning it into markup is the
/// renderer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichTextBlock(serde_json::Value);

impl RichTextBlock {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Flattened text of the block (empty for images and embeds)
    pub fn text(&self) -> &str {
        self.0
            .get("text")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
    }

    /// Raw payload for the renderer
    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Link to a neighbouring post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavPost {
    pub uid: String,
    pub title: String,
}

/// Previous/next navigation, at most one post per side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationLinks {
    pub prev_post: Option<NavPost>,
    pub next_post: Option<NavPost>,
}

/// Whether a post was edited after its first publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditedInfo {
    pub edited: bool,
    pub formatted_edit_timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rich_text_block_text() {
        let paragraph = RichTextBlock::new(json!({"type": "paragraph", "text": "a b", "spans": []}));
        assert_eq!(paragraph.text(), "a b");

        let image = RichTextBlock::new(json!({"type": "image", "url": "https://img"}));
        assert_eq!(image.text(), "");
    }

    #[test]
    fn test_rich_text_block_serializes_transparently() {
        let raw = json!({"type": "paragraph", "text": "hi", "spans": []});
        let block = RichTextBlock::new(raw.clone());
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }
}
