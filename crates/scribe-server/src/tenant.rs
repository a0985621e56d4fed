//! Tenant identity extraction.
//!
//! Upstream authentication (a gateway or reverse proxy) is expected to
//! resolve credentials and stamp the tenant on this header. Every data
//! route requires it; requests without it never reach a queue or store.

use axum::http::HeaderMap;

use crate::error::ServerError;

/// Header carrying the authenticated tenant.
pub const TENANT_HEADER: &str = "x-scribe-tenant";

/// Read the authenticated tenant from the request headers.
pub fn require_tenant(headers: &HeaderMap) -> Result<String, ServerError> {
    let tenant = headers
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .ok_or(ServerError::MissingTenant)?;

    if tenant.is_empty() {
        return Err(ServerError::MissingTenant);
    }
    Ok(tenant.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_present_header_is_returned_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static(" client_a "));
        assert_eq!(require_tenant(&headers).unwrap(), "client_a");
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_tenant(&headers),
            Err(ServerError::MissingTenant)
        ));
    }

    #[test]
    fn test_empty_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static(""));
        assert!(matches!(
            require_tenant(&headers),
            Err(ServerError::MissingTenant)
        ));
    }
}
