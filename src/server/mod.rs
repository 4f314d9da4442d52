//! Blog server
//!
//! Serves the generated site. Posts missing from the output, or requested in
//! preview mode, are rendered on demand; published renders are written back
//! to disk so later requests hit the static file.

mod error;
pub mod preview;

pub use error::ServerError;
pub use preview::{PreviewState, PREVIEW_COOKIE};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::generator::Generator;
use crate::prismic::ContentSource;
use crate::Spacetraveling;

/// Server state
pub struct ServerState {
    app: Spacetraveling,
    generator: Generator,
    source: Arc<dyn ContentSource>,
    preview_secret: Option<String>,
}

impl ServerState {
    pub fn new(app: &Spacetraveling, source: Arc<dyn ContentSource>) -> Result<Self> {
        Ok(Self {
            app: app.clone(),
            generator: Generator::new(app)?,
            source,
            preview_secret: app.config.preview.secret.clone(),
        })
    }
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    let static_files =
        ServeDir::new(&state.app.public_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/post/:slug", get(post_handler))
        .route("/api/exit-preview", get(preview::exit_preview))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(app: &Spacetraveling, ip: &str, port: u16) -> Result<()> {
    let source = app.content_source()?;
    let state = Arc::new(ServerState::new(app, source)?);

    if state.preview_secret.is_none() {
        tracing::info!("No preview secret configured, preview mode disabled");
    }

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Render a post page
///
/// Route: `GET /post/:slug`
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    if !is_valid_slug(&slug) {
        return Err(ServerError::NotFound(slug));
    }

    let preview = PreviewState::from_headers(&headers, state.preview_secret.as_deref());

    if !preview.active {
        let output_path = state.generator.post_output_path(&slug);
        if let Ok(html) = tokio::fs::read_to_string(&output_path).await {
            return Ok(Html(html).into_response());
        }
    }

    tracing::debug!(slug = %slug, preview = preview.active, "Rendering post on demand");
    let html = state
        .generator
        .build_post_html(state.source.as_ref(), &slug, preview.token.as_ref())
        .await?;

    // Drafts never reach the public output
    if !preview.active {
        if let Err(e) = state.generator.write_post(&slug, &html).await {
            tracing::warn!("Failed to cache post {}: {}", slug, e);
        }
    }

    Ok(Html(html).into_response())
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::prismic::{Document, FixtureSource};
    use axum::body::Body;
    use axum::http::{header::COOKIE, HeaderValue, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    const SECRET: &str = "server-secret";

    fn doc(id: &str, uid: &str, title: &str, first: &str) -> Document {
        serde_json::from_value(json!({
            "id": id,
            "uid": uid,
            "type": "posts",
            "first_publication_date": first,
            "last_publication_date": first,
            "data": {
                "title": title,
                "content": [
                    { "heading": "Intro", "body": [{ "type": "paragraph", "text": "hello there", "spans": [] }] }
                ]
            }
        }))
        .unwrap()
    }

    fn state(dir: &std::path::Path, documents: Vec<Document>) -> Arc<ServerState> {
        let mut config = SiteConfig::default();
        config.preview.secret = Some(SECRET.to_string());
        let app = Spacetraveling::with_config(dir, config);
        Arc::new(ServerState::new(&app, Arc::new(FixtureSource::new(documents))).unwrap())
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_renders_and_caches_unknown_post() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            dir.path(),
            vec![doc("A", "new-post", "New post", "2021-04-01T12:00:00Z")],
        );

        let response = post_handler(
            State(state.clone()),
            Path("new-post".to_string()),
            HeaderMap::new(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("New post"));
        assert!(state.generator.post_output_path("new-post").exists());
    }

    #[tokio::test]
    async fn test_serves_generated_file_first() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), Vec::new());
        state
            .generator
            .write_post("cached", "<html>cached copy</html>")
            .await
            .unwrap();

        let response = post_handler(State(state), Path("cached".to_string()), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "<html>cached copy</html>");
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), Vec::new());

        let err = post_handler(
            State(state.clone()),
            Path("missing-slug".to_string()),
            HeaderMap::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = post_handler(State(state), Path("../etc".to_string()), HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_preview_bypasses_cache_and_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            dir.path(),
            vec![doc("A", "draft", "Draft title", "2021-04-01T12:00:00Z")],
        );
        state
            .generator
            .write_post("draft", "<html>stale</html>")
            .await
            .unwrap();

        let cookie = preview::sign_preview(SECRET, "preview-ref").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{}={}", PREVIEW_COOKIE, cookie)).unwrap(),
        );

        let response = post_handler(State(state.clone()), Path("draft".to_string()), headers)
            .await
            .unwrap();
        let body = body_text(response).await;
        assert!(body.contains("Draft title"));
        assert!(body.contains("/api/exit-preview"));

        let on_disk =
            std::fs::read_to_string(state.generator.post_output_path("draft")).unwrap();
        assert_eq!(on_disk, "<html>stale</html>");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("como-utilizar-hooks"));
        assert!(is_valid_slug("post_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug(".."));
    }

    #[tokio::test]
    async fn test_router_exit_preview() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(dir.path(), Vec::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/exit-preview")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get("location").unwrap(), "/");
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_router_post_and_static_routes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(
            dir.path(),
            vec![doc("A", "routed", "Routed post", "2021-04-01T12:00:00Z")],
        );
        std::fs::create_dir_all(&state.app.public_dir).unwrap();
        std::fs::write(state.app.public_dir.join("robots.txt"), "User-agent: *").unwrap();
        let app = router(state);

        let request = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

        let response = app.clone().oneshot(request("/post/routed")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Routed post"));

        let response = app.clone().oneshot(request("/post/missing-slug")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.clone().oneshot(request("/robots.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "User-agent: *");

        let response = app.oneshot(request("/nothing-here")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
