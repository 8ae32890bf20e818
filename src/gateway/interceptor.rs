//! Request authorization
//!
//! The token is never stored on the HTTP client. Each request is authorized
//! from the current session state right before it is executed.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Request;
use tracing::warn;

/// Source of the current session token
pub trait SessionProvider: Send + Sync {
    /// Bearer token for the current session, if authenticated
    fn token(&self) -> Option<String>;

    /// Drop stored credentials; called on any 401
    fn invalidate(&self);
}

/// Attach `Authorization: Bearer <token>` when a token is present
pub fn authorize(mut request: Request, token: Option<&str>) -> Request {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return request;
    };

    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(e) => warn!("Stored token is not a valid header value: {}", e),
    }

    request
}
