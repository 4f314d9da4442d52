//! Preview mode
//!
//! An external entry point stores the CMS preview ref in a signed cookie.
//! Requests carrying a valid cookie are rendered against draft content;
//! `/api/exit-preview` clears it.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use base64::{engine::general_purpose, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use sha2::Sha256;

use crate::prismic::PreviewToken;

type HmacSha256 = Hmac<Sha256>;

/// Name of the preview cookie
pub const PREVIEW_COOKIE: &str = "spacetraveling.preview";

/// Preview state of a single request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub active: bool,
    pub token: Option<PreviewToken>,
}

impl PreviewState {
    /// Read the preview cookie from request headers
    ///
    /// Without a secret, or with a missing or badly signed cookie, the
    /// request is in normal mode.
    pub fn from_headers(headers: &HeaderMap, secret: Option<&str>) -> Self {
        let Some(secret) = secret else {
            return Self::default();
        };

        match get_cookie_value(headers, PREVIEW_COOKIE).and_then(|v| verify_preview(secret, &v)) {
            Some(token) => Self {
                active: true,
                token: Some(token),
            },
            None => Self::default(),
        }
    }
}

/// Sign a preview ref into a cookie value `<encoded token>:<signature>`
pub fn sign_preview(secret: &str, token: &str) -> Result<String, String> {
    let signature = signature(secret, token)?;
    let encoded = utf8_percent_encode(token, NON_ALPHANUMERIC).to_string();
    Ok(format!(
        "{}:{}",
        encoded,
        general_purpose::URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Check a cookie value and recover the preview ref
pub fn verify_preview(secret: &str, cookie_value: &str) -> Option<PreviewToken> {
    let (encoded, signature_b64) = cookie_value.rsplit_once(':')?;
    let token = percent_decode_str(encoded).decode_utf8().ok()?;
    let signature = general_purpose::URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(token.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(PreviewToken::new(token))
}

fn signature(secret: &str, token: &str) -> Result<Vec<u8>, String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "Invalid secret key")?;
    mac.update(token.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Read a cookie from the request headers
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

/// Leave preview mode
///
/// Route: `GET /api/exit-preview`. Always clears the cookie and redirects
/// home with a 307, whether or not a preview was active.
pub async fn exit_preview() -> Response {
    let cookie = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        PREVIEW_COOKIE
    );

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(SET_COOKIE, value);
    }

    tracing::debug!("Leaving preview mode");
    (headers, Redirect::temporary("/")).into_response()
}
