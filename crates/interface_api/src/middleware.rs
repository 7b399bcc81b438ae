//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::access::Caller;
use crate::error::ApiError;
use crate::AppState;

/// Header naming the caller's role
pub const ROLE_HEADER: &str = "x-role";

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Role resolution middleware
///
/// Resolves the `x-role` header against the role directory and stores the
/// [`Caller`] in request extensions.
pub async fn role_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let role_name = request
        .headers()
        .get(ROLE_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let Some(role_name) = role_name else {
        warn!("Missing x-role header");
        return Err(ApiError::Unauthorized("Missing x-role header".to_string()));
    };

    let Some(role) = state.roles.find(role_name).cloned() else {
        warn!(role = %role_name, "Unknown role");
        return Err(ApiError::Unauthorized(format!("Unknown role: {role_name}")));
    };

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let caller = Caller { role, request_id };
    request.extensions_mut().insert(caller.clone());

    // Surfaced on the response for the audit layer outside this one
    let mut response = next.run(request).await;
    response.extensions_mut().insert(caller);
    Ok(response)
}

/// One audited API request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub method: String,
    pub uri: String,
    /// Resolved role, or `anonymous` when the request was turned away first
    pub role: String,
    pub status: u16,
    pub duration_ms: i64,
}

/// Audit logging middleware
///
/// Logs all API requests for compliance and debugging, rejected ones
/// included. Must sit outside [`role_middleware`]; the entry is also left in
/// the response extensions.
pub async fn audit_middleware(
    State(_state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().to_string();

    let start = Utc::now();

    let mut response = next.run(request).await;

    let entry = AuditEntry {
        method,
        uri,
        role: response
            .extensions()
            .get::<Caller>()
            .map(|c| c.role.name.clone())
            .unwrap_or_else(|| "anonymous".to_string()),
        status: response.status().as_u16(),
        duration_ms: (Utc::now() - start).num_milliseconds(),
    };

    info!(
        method = %entry.method,
        uri = %entry.uri,
        role = %entry.role,
        status = entry.status,
        duration_ms = entry.duration_ms,
        "API request"
    );

    response.extensions_mut().insert(entry);
    response
}
