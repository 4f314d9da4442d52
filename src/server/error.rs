//! Error responses for on-demand rendering
//!
//! Errors are rendered as small HTML pages since every route serves HTML.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::error::ContentError;
use crate::generator::PageError;
use crate::templates::rich_text::escape_html;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No post with this slug
    #[error("not found: {0}")]
    NotFound(String),

    /// The content source failed
    #[error("content error: {0}")]
    Content(ContentError),

    /// Rendering or writing failed
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ContentError> for ServerError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound { uid, .. } => Self::NotFound(uid),
            other => Self::Content(other),
        }
    }
}

impl From<PageError> for ServerError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Content(e) => e.into(),
            PageError::Render(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            Self::NotFound(slug) => (
                StatusCode::NOT_FOUND,
                "Post não encontrado",
                format!("Nenhum post com o endereço \"{slug}\"."),
            ),
            Self::Content(err) => {
                tracing::error!(error = %err, "content source error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro",
                    "Não foi possível carregar o post. Tente novamente mais tarde.".to_string(),
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro",
                    "Ocorreu um erro interno. Tente novamente mais tarde.".to_string(),
                )
            }
        };

        let page = format!(
            "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head><meta charset=\"utf-8\"><title>{title} | spacetraveling</title></head>\n<body><main><h1>{title}</h1><p>{message}</p><a href=\"/\">Voltar</a></main></body>\n</html>\n",
            title = escape_html(title),
            message = escape_html(&message),
        );

        (status, Html(page)).into_response()
    }
}
