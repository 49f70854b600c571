//! API Middleware
//!
//! Principal resolution and request logging.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::domain::Principal;
use crate::error::AppError;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "X-Request-User-Id";

/// Header carrying the staff flag of the authenticated user
pub const STAFF_HEADER: &str = "X-Request-User-Staff";

/// Header carrying the request correlation id
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

// =========================================================================
// Principal resolution
// =========================================================================

/// Read the principal forwarded by the authenticating gateway
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, AppError> {
    let raw_id = headers
        .get(USER_ID_HEADER)
        .ok_or(AppError::MissingPrincipal)?
        .to_str()
        .map_err(|_| AppError::InvalidPrincipal(format!("{} is not valid text", USER_ID_HEADER)))?;

    let id = raw_id.trim().parse().map_err(|_| {
        AppError::InvalidPrincipal(format!("{} must be an integer", USER_ID_HEADER))
    })?;

    let is_privileged = match headers.get(STAFF_HEADER).map(|v| v.to_str()) {
        None => false,
        Some(Ok(value)) => parse_flag(value).ok_or_else(|| {
            AppError::InvalidPrincipal(format!("{} must be true or false", STAFF_HEADER))
        })?,
        Some(Err(_)) => {
            return Err(AppError::InvalidPrincipal(format!(
                "{} is not valid text",
                STAFF_HEADER
            )))
        }
    };

    Ok(Principal { id, is_privileged })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Attach the [`Principal`] to the request, rejecting requests without one
pub async fn principal_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let principal = principal_from_headers(request.headers())?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let principal = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = %correlation_id,
        principal = ?principal,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        correlation_id = %correlation_id,
        principal = ?principal,
        "Request completed"
    );

    response
}
