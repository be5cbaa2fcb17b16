/// Session cookie handling
///
/// The session token travels in an HttpOnly cookie named [`SESSION_COOKIE`].
/// Non-browser clients may send the same token as `Authorization: Bearer`.
/// When both are present the cookie wins.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use taskboard_shared::auth::session::{session_cookie, token_from_headers};
///
/// let cookie = session_cookie("abc.def.ghi", 3600, false);
/// assert!(cookie.starts_with("jwt=abc.def.ghi;"));
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; jwt=abc.def.ghi"));
/// assert_eq!(token_from_headers(&headers), Some("abc.def.ghi".to_string()));
/// ```

use axum::http::{header, HeaderMap};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "jwt";

/// Builds the `Set-Cookie` value that starts a session
///
/// `secure` adds the `Secure` attribute; it is set in production only so the
/// cookie still works over plain HTTP during local development.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );

    if secure {
        cookie.push_str("; Secure");
    }

    cookie
}

/// Builds the `Set-Cookie` value that ends a session
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Extracts the session token from request headers
///
/// Looks at every `Cookie` header first, then at `Authorization: Bearer`.
/// Empty values are treated as absent.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string());

    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
