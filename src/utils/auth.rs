use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Checks an `Authorization` header value against the configured shared
/// secret. When no secret is configured the server is open and every
/// request passes.
pub fn check_token(expected: Option<&str>, header: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(secret) => header
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|token| token == secret),
    }
}

/// Resolves the originating client address, preferring proxy-supplied
/// headers over the socket peer address.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for name in ["cf-connecting-ip", "x-real-ip"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            return value.to_string();
        }
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_open_server_accepts_anything() {
        assert!(check_token(None, None));
        assert!(check_token(None, Some("Bearer whatever")));
        assert!(check_token(None, Some("garbage")));
    }

    #[test]
    fn test_configured_token_requires_exact_bearer() {
        assert!(check_token(Some("secret"), Some("Bearer secret")));
        assert!(!check_token(Some("secret"), Some("Bearer wrong")));
        assert!(!check_token(Some("secret"), Some("secret")));
        assert!(!check_token(Some("secret"), Some("bearer secret")));
        assert!(!check_token(Some("secret"), None));
    }

    #[test]
    fn test_client_address_header_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 5.6.7.8"));
        assert_eq!(client_address(&headers, None), "1.2.3.4");

        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_address(&headers, None), "9.9.9.9");

        headers.insert("cf-connecting-ip", HeaderValue::from_static("8.8.8.8"));
        assert_eq!(client_address(&headers, None), "8.8.8.8");
    }

    #[test]
    fn test_client_address_falls_back_to_peer() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        assert_eq!(client_address(&headers, Some(peer)), "10.0.0.1");
        assert_eq!(client_address(&headers, None), "unknown");
    }
}
