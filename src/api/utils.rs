// src/api/utils.rs

use actix_web::{HttpMessage, HttpRequest};
use crate::api::middleware::auth::AuthSession;
use log::debug;

/// Extract the bearer token from an HTTP request.
///
/// Prefers the session placed in request extensions by the
/// TokenValidator middleware, falling back to the Authorization header
/// for routes that run outside it.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(session) = req.extensions().get::<AuthSession>() {
        debug!("✅ Using token from request extensions, session: {}", session.claims.sid);
        return Some(session.token.clone());
    }

    let header_str = req.headers().get("Authorization")?.to_str().ok()?;
    header_str.strip_prefix("Bearer ").map(|token| token.to_string())
}
