//! Principal extraction middleware
//!
//! The fronting auth service terminates authentication (JWT verification,
//! revocation checks) and forwards the verified subject id in `x-user-id`.
//! This middleware is the single trust boundary where that value becomes a
//! typed [`Principal`]; nothing downstream re-parses user ids.

use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;

use super::types::ApiError;
use crate::principal::Principal;

/// Header populated by the fronting auth service
pub const USER_ID_HEADER: &str = "x-user-id";

/// Axum middleware: require a valid principal on every private route
pub async fn principal_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = extract_principal(request.headers())?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn extract_principal(headers: &HeaderMap) -> Result<Principal, ApiError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::unauthorized("User not authenticated or missing user ID"))?;

    let user_id: i64 = raw
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| ApiError::unauthorized("User not authenticated or missing user ID"))?;

    if user_id <= 0 {
        return Err(ApiError::unauthorized(
            "User not authenticated or missing user ID",
        ));
    }

    Ok(Principal::new(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_valid() {
        let principal = extract_principal(&headers_with("42")).unwrap();
        assert_eq!(principal.user_id, 42);
    }

    #[test]
    fn test_extract_missing() {
        assert!(extract_principal(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_extract_invalid() {
        assert!(extract_principal(&headers_with("abc")).is_err());
        assert!(extract_principal(&headers_with("0")).is_err());
        assert!(extract_principal(&headers_with("-7")).is_err());
        assert!(extract_principal(&headers_with("1.5")).is_err());
    }
}
