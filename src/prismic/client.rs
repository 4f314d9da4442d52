//! HTTP client for the Prismic REST API v2

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{ApiRoot, ContentSource, PreviewToken, Query, SearchResponse};
use crate::config::PrismicConfig;
use crate::error::ContentError;

/// Longest error body kept in [`ContentError::Api`]
const MAX_ERROR_BODY: usize = 512;

/// How long a fetched master ref is reused before asking the API root again
const MASTER_REF_TTL: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CachedRef {
    reference: String,
    fetched_at: Instant,
}

/// Configured client for one Prismic repository
///
/// The master ref is looked up once and shared by every query (and every
/// clone) until it expires, so the queries behind one page read the same
/// content version.
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    master: Arc<Mutex<Option<CachedRef>>>,
    ref_ttl: Duration,
}

impl PrismicClient {
    /// Create a client for an API endpoint such as
    /// `https://spacetraveling.cdn.prismic.io/api/v2`
    pub fn new(
        endpoint: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ContentError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
            master: Arc::new(Mutex::new(None)),
            ref_ttl: MASTER_REF_TTL,
        })
    }

    /// Change how long the master ref is reused
    pub fn with_ref_ttl(mut self, ttl: Duration) -> Self {
        self.ref_ttl = ttl;
        self
    }

    /// Create a client from the `prismic` section of the site config
    pub fn from_config(config: &PrismicConfig) -> Result<Self, ContentError> {
        Self::new(
            &config.api_endpoint,
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The ref currently serving published content
    ///
    /// Concurrent callers wait for a single lookup.
    pub async fn master_ref(&self) -> Result<String, ContentError> {
        let mut cached = self.master.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.fetched_at.elapsed() < self.ref_ttl {
                return Ok(entry.reference.clone());
            }
        }

        let reference = self.fetch_master_ref().await?;
        tracing::debug!(reference = %reference, "fetched master ref");
        *cached = Some(CachedRef {
            reference: reference.clone(),
            fetched_at: Instant::now(),
        });
        Ok(reference)
    }

    async fn forget_master_ref(&self) {
        *self.master.lock().await = None;
    }

    async fn fetch_master_ref(&self) -> Result<String, ContentError> {
        let mut params = Vec::new();
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        let root: ApiRoot = self.get_json(&self.endpoint, &params).await?;
        root.master_ref()
            .map(str::to_string)
            .ok_or_else(|| ContentError::Malformed("API root lists no master ref".to_string()))
    }

    /// Query-string parameters for a search against `reference`
    pub fn search_params(&self, query: &Query, reference: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("ref", reference.to_string()), ("q", query.q_param())];

        if let Some(size) = query.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        if let Some(after) = &query.after {
            params.push(("after", after.clone()));
        }
        if let Some(orderings) = query.orderings_param() {
            params.push(("orderings", orderings));
        }
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ContentError> {
        let response = self.http.get(url).query(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(ContentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(
        &self,
        query: &Query,
        preview: Option<&PreviewToken>,
    ) -> Result<SearchResponse, ContentError> {
        let reference = match preview {
            Some(token) => token.as_str().to_string(),
            None => self.master_ref().await?,
        };

        let url = format!("{}/documents/search", self.endpoint);
        let params = self.search_params(query, &reference);
        tracing::debug!(q = %query.q_param(), preview = preview.is_some(), "querying content API");

        let result = self.get_json(&url, &params).await;
        if preview.is_none() && matches!(result, Err(ContentError::Api { .. })) {
            // A publish may have retired the cached ref
            self.forget_master_ref().await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{NavigationResolver, PostResolver};
    use crate::prismic::query::{Direction, FIRST_PUBLICATION_DATE};
    use axum::extract::{Query as UrlQuery, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};

    /// In-process stand-in for the content API
    #[derive(Default)]
    struct Stub {
        root_hits: AtomicUsize,
        search_hits: AtomicUsize,
        refs: std::sync::Mutex<Vec<String>>,
        failing_searches: AtomicUsize,
    }

    impl Stub {
        fn refs(&self) -> Vec<String> {
            self.refs.lock().unwrap().clone()
        }
    }

    async fn api_root(State(stub): State<Arc<Stub>>) -> Json<serde_json::Value> {
        let n = stub.root_hits.fetch_add(1, SeqCst) + 1;
        Json(json!({
            "refs": [
                { "id": "master", "ref": format!("master-{n}"), "label": "Master", "isMasterRef": true }
            ]
        }))
    }

    async fn search(
        State(stub): State<Arc<Stub>>,
        UrlQuery(params): UrlQuery<HashMap<String, String>>,
    ) -> Response {
        stub.search_hits.fetch_add(1, SeqCst);
        stub.refs
            .lock()
            .unwrap()
            .push(params.get("ref").cloned().unwrap_or_default());

        if stub
            .failing_searches
            .fetch_update(SeqCst, SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return (StatusCode::BAD_REQUEST, "e".repeat(2000)).into_response();
        }

        Json(json!({
            "page": 1,
            "total_pages": 1,
            "results": [
                { "id": "A", "uid": "a", "type": "posts", "data": { "title": "A" } }
            ]
        }))
        .into_response()
    }

    async fn serve(stub: Arc<Stub>) -> PrismicClient {
        let app = Router::new()
            .route("/api/v2", get(api_root))
            .route("/api/v2/documents/search", get(search))
            .with_state(stub);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        PrismicClient::new(
            &format!("http://{}/api/v2", addr),
            None,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn client(token: Option<&str>) -> PrismicClient {
        PrismicClient::new(
            "https://spacetraveling.cdn.prismic.io/api/v2/",
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_trailing_slash_stripped() {
        assert_eq!(
            client(None).endpoint(),
            "https://spacetraveling.cdn.prismic.io/api/v2"
        );
    }

    #[test]
    fn test_search_params_adjacency() {
        let query = Query::by_type("posts")
            .page_size(1)
            .after("YF1")
            .order_by(FIRST_PUBLICATION_DATE, Direction::Desc);
        let params = client(Some("secret")).search_params(&query, "master");

        assert_eq!(
            params,
            vec![
                ("ref", "master".to_string()),
                ("q", r#"[[at(document.type, "posts")]]"#.to_string()),
                ("pageSize", "1".to_string()),
                ("after", "YF1".to_string()),
                (
                    "orderings",
                    "[document.first_publication_date desc]".to_string()
                ),
                ("access_token", "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_access_token_ignored() {
        let params = client(Some("")).search_params(&Query::by_type("posts"), "master");
        assert!(params.iter().all(|(k, _)| *k != "access_token"));
    }

    #[tokio::test]
    async fn test_post_page_looks_up_master_ref_once() {
        let stub = Arc::new(Stub::default());
        let client = serve(stub.clone()).await;

        let post = PostResolver::new(&client, "posts")
            .resolve_by_slug("a", None)
            .await
            .unwrap();
        NavigationResolver::new(&client, "posts")
            .find_adjacent(&post.id, None)
            .await
            .unwrap();

        assert_eq!(stub.root_hits.load(SeqCst), 1);
        assert_eq!(stub.search_hits.load(SeqCst), 3);
        assert!(stub.refs().iter().all(|r| r == "master-1"));

        PostResolver::new(&client, "posts")
            .list_slugs()
            .await
            .unwrap();
        assert_eq!(stub.root_hits.load(SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_master_ref_is_fetched_again() {
        let stub = Arc::new(Stub::default());
        let client = serve(stub.clone()).await.with_ref_ttl(Duration::ZERO);

        let query = Query::by_type("posts");
        client.query(&query, None).await.unwrap();
        client.query(&query, None).await.unwrap();

        assert_eq!(stub.root_hits.load(SeqCst), 2);
        assert_eq!(stub.refs(), vec!["master-1", "master-2"]);
    }

    #[tokio::test]
    async fn test_preview_token_replaces_ref() {
        let stub = Arc::new(Stub::default());
        let client = serve(stub.clone()).await;

        let token = PreviewToken::new("preview-ref");
        client
            .query(&Query::by_type("posts"), Some(&token))
            .await
            .unwrap();

        assert_eq!(stub.root_hits.load(SeqCst), 0);
        assert_eq!(stub.refs(), vec!["preview-ref"]);
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let stub = Arc::new(Stub::default());
        stub.failing_searches.store(1, SeqCst);
        let client = serve(stub.clone()).await;

        let err = client
            .query(&Query::by_type("posts"), None)
            .await
            .unwrap_err();
        match &err {
            ContentError::Api { status, message } => {
                assert_eq!(*status, 400);
                assert_eq!(message.chars().count(), MAX_ERROR_BODY);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(!err.is_not_found());

        // The failed ref is dropped and looked up again
        client.query(&Query::by_type("posts"), None).await.unwrap();
        assert_eq!(stub.root_hits.load(SeqCst), 2);
        assert_eq!(stub.refs(), vec!["master-1", "master-2"]);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PrismicClient::new(
            &format!("http://{}/api/v2", addr),
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client
            .query(&Query::by_type("posts"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Transport(_)));
        assert!(!err.is_not_found());
    }
}
