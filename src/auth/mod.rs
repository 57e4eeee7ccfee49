use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

/// API-key gate for the admin surface
pub struct AuthService {
    enabled: bool,
    api_keys: Arc<Vec<String>>,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            enabled: config.enabled,
            api_keys: Arc::new(config.api_keys.clone()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn validate_key(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }

        // Enabled with no keys configured locks the admin surface
        self.api_keys
            .iter()
            .any(|k| bool::from(k.as_bytes().ct_eq(key.as_bytes())))
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get("X-API-Key").and_then(|h| h.to_str().ok()) {
        return Some(key);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub async fn auth_middleware(
    auth_service: Arc<AuthService>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let api_key = extract_api_key(&headers).unwrap_or("");

    if auth_service.validate_key(api_key) {
        next.run(request).await
    } else {
        (StatusCode::FORBIDDEN, "Invalid or missing API key").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(enabled: bool, keys: &[&str]) -> AuthService {
        AuthService::new(&AuthConfig {
            enabled,
            api_keys: keys.iter().map(|k| k.to_string()).collect(),
        })
    }

    #[test]
    fn test_validate_key() {
        let auth = service(true, &["k1", "k2"]);
        assert!(auth.validate_key("k2"));
        assert!(!auth.validate_key("k3"));
        assert!(!auth.validate_key(""));

        assert!(service(false, &[]).validate_key(""));
        assert!(!service(true, &[]).validate_key(""));
    }

    #[test]
    fn test_extract_api_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
        assert_eq!(extract_api_key(&headers), Some("secret"));

        headers.insert("X-API-Key", "other".parse().unwrap());
        assert_eq!(extract_api_key(&headers), Some("other"));
    }
}
