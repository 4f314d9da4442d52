//! Navigation resolver - finds the posts published right before and after one

use super::resolver::text_field;
use super::{NavPost, NavigationLinks};
use crate::error::ContentError;
use crate::prismic::query::FIRST_PUBLICATION_DATE;
use crate::prismic::{ContentSource, Direction, PreviewToken, Query};

/// Resolves prev/next links within one document type
pub struct NavigationResolver<'a> {
    source: &'a dyn ContentSource,
    doc_type: &'a str,
}

impl<'a> NavigationResolver<'a> {
    pub fn new(source: &'a dyn ContentSource, doc_type: &'a str) -> Self {
        Self { source, doc_type }
    }

    /// Find the neighbours of the post with CMS id `post_id`
    ///
    /// Both lookups use `post_id` as an `after` cursor on the same ordering
    /// field. Walking descending from the pivot yields the previous post,
    /// walking ascending yields the next one. A missing side is not an error.
    pub async fn find_adjacent(
        &self,
        post_id: &str,
        preview: Option<&PreviewToken>,
    ) -> Result<NavigationLinks, ContentError> {
        let (prev_post, next_post) = tokio::try_join!(
            self.neighbour(post_id, Direction::Desc, preview),
            self.neighbour(post_id, Direction::Asc, preview),
        )?;

        Ok(NavigationLinks {
            prev_post,
            next_post,
        })
    }

    async fn neighbour(
        &self,
        post_id: &str,
        direction: Direction,
        preview: Option<&PreviewToken>,
    ) -> Result<Option<NavPost>, ContentError> {
        let query = Query::by_type(self.doc_type)
            .page_size(1)
            .after(post_id)
            .order_by(FIRST_PUBLICATION_DATE, direction);

        let response = self.source.query(&query, preview).await?;

        let Some(document) = response.results.into_iter().next() else {
            return Ok(None);
        };

        // Only the link fields are read, the neighbour's body is not validated
        let Some(uid) = document.uid else {
            tracing::warn!("Neighbour document {} has no uid, omitting link", document.id);
            return Ok(None);
        };
        let title = text_field(document.data.get("title"));
        Ok(Some(NavPost { uid, title }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::{Document, FixtureSource};
    use serde_json::json;

    fn doc(id: &str, uid: &str, first: &str, last: &str) -> Document {
        serde_json::from_value(json!({
            "id": id,
            "uid": uid,
            "type": "posts",
            "first_publication_date": first,
            "last_publication_date": last,
            "data": { "title": format!("Title {uid}") }
        }))
        .unwrap()
    }

    fn source() -> FixtureSource {
        // Edit timestamps run in the opposite order to first publication
        FixtureSource::new(vec![
            doc("B", "middle", "2021-02-01T00:00:00Z", "2021-02-10T00:00:00Z"),
            doc("C", "newest", "2021-03-01T00:00:00Z", "2021-03-02T00:00:00Z"),
            doc("A", "oldest", "2021-01-01T00:00:00Z", "2021-06-01T00:00:00Z"),
        ])
    }

    #[tokio::test]
    async fn test_middle_post_has_both_neighbours() {
        let source = source();
        let nav = NavigationResolver::new(&source, "posts")
            .find_adjacent("B", None)
            .await
            .unwrap();

        assert_eq!(
            nav.prev_post,
            Some(NavPost {
                uid: "oldest".to_string(),
                title: "Title oldest".to_string()
            })
        );
        assert_eq!(nav.next_post.map(|p| p.uid), Some("newest".to_string()));
    }

    #[tokio::test]
    async fn test_first_post_has_no_prev() {
        let source = source();
        let nav = NavigationResolver::new(&source, "posts")
            .find_adjacent("A", None)
            .await
            .unwrap();

        assert!(nav.prev_post.is_none());
        assert_eq!(nav.next_post.map(|p| p.uid), Some("middle".to_string()));
    }

    #[tokio::test]
    async fn test_last_post_has_no_next() {
        let source = source();
        let nav = NavigationResolver::new(&source, "posts")
            .find_adjacent("C", None)
            .await
            .unwrap();

        assert_eq!(nav.prev_post.map(|p| p.uid), Some("middle".to_string()));
        assert!(nav.next_post.is_none());
    }

    #[tokio::test]
    async fn test_single_post_has_no_neighbours() {
        let source = FixtureSource::new(vec![doc(
            "A",
            "only",
            "2021-01-01T00:00:00Z",
            "2021-01-01T00:00:00Z",
        )]);
        let nav = NavigationResolver::new(&source, "posts")
            .find_adjacent("A", None)
            .await
            .unwrap();

        assert_eq!(nav, NavigationLinks::default());
    }

    #[tokio::test]
    async fn test_neighbour_without_uid_is_omitted() {
        let no_uid: Document = serde_json::from_value(json!({
            "id": "Z",
            "type": "posts",
            "first_publication_date": "2020-12-01T00:00:00Z",
            "data": { "title": "Unlinked" }
        }))
        .unwrap();
        let source = FixtureSource::new(vec![
            no_uid,
            doc("A", "oldest", "2021-01-01T00:00:00Z", "2021-01-01T00:00:00Z"),
            doc("B", "newest", "2021-02-01T00:00:00Z", "2021-02-01T00:00:00Z"),
        ]);

        let nav = NavigationResolver::new(&source, "posts")
            .find_adjacent("A", None)
            .await
            .unwrap();

        assert!(nav.prev_post.is_none());
        assert_eq!(nav.next_post.map(|p| p.uid), Some("newest".to_string()));
    }
}
