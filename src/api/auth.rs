use axum::http::{header::AUTHORIZATION, HeaderMap};
use sha2::{Digest, Sha256};

use crate::error::{HivemindError, Result};

fn extract_bearer_token(raw: &str) -> Option<&str> {
    raw.strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
}

/// SHA-256 fingerprint of the presented token, recorded in the audit log so
/// operators can be distinguished without storing the token itself.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate the bearer token on an incoming request. Returns the fingerprint
/// of the accepted token for audit attribution.
pub fn ensure_authorized(headers: &HeaderMap, expected: &str) -> Result<String> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| HivemindError::Auth("missing bearer token".to_string()))?;

    if token.is_empty() || token != expected {
        return Err(HivemindError::Auth("invalid bearer token".to_string()));
    }
    Ok(token_fingerprint(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_token_accepted() {
        let fp = ensure_authorized(&headers_with("Bearer secret"), "secret").unwrap();
        assert_eq!(fp, token_fingerprint("secret"));
    }

    #[test]
    fn test_lowercase_scheme_and_padding_accepted() {
        assert!(ensure_authorized(&headers_with("bearer  secret "), "secret").is_ok());
    }

    #[test]
    fn test_missing_header_rejected() {
        let err = ensure_authorized(&HeaderMap::new(), "secret").unwrap_err();
        assert!(matches!(err, HivemindError::Auth(_)));
    }

    #[test]
    fn test_wrong_token_rejected() {
        assert!(ensure_authorized(&headers_with("Bearer nope"), "secret").is_err());
    }

    #[test]
    fn test_fingerprint_is_stable_and_not_the_token() {
        let fp = token_fingerprint("secret");
        assert_eq!(fp, token_fingerprint("secret"));
        assert_ne!(fp, "secret");
        assert_eq!(fp.len(), 64);
    }
}
