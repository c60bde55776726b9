//! Identity extraction.
//!
//! Authentication itself lives in the identity proxy fronting this service;
//! by the time a request arrives here the proxy has verified the session and
//! stamped `x-user-id`, `x-org-id`, and `x-role` headers. Requests without
//! user and org headers are rejected with 401.

use crate::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub org_id: String,
    pub role: Option<String>,
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, "x-user-id")
            .ok_or_else(|| AppError::unauthorized("missing x-user-id header"))?;
        let org_id = header(parts, "x-org-id")
            .ok_or_else(|| AppError::unauthorized("missing x-org-id header"))?;
        Ok(Identity {
            user_id,
            org_id,
            role: header(parts, "x-role"),
        })
    }
}
