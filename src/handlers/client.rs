use axum::Json;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::metrics::REQUEST_TOTAL;
use crate::state::AppState;

/// Identifier the rate limiters key on, usually the caller's IP.
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        Ok(ClientId(resolve_client_ip(&parts.headers, peer)))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// proxy headers first, then the socket peer
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(ip) = header_value(headers, "cf-connecting-ip") {
        return ip.to_string();
    }
    if let Some(ip) = header_value(headers, "x-real-ip") {
        return ip.to_string();
    }
    if let Some(forwarded) = header_value(headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

// Reports which identifier the limiters see for this caller
pub async fn client_ip_handler(
    State(state): State<Arc<AppState>>,
    ClientId(ip): ClientId,
) -> impl IntoResponse {
    REQUEST_TOTAL.inc();
    let cooldown_ms = state.api_limiter.remaining_cooldown(&ip);
    Json(serde_json::json!({
        "ip": ip,
        "cooldownMs": cooldown_ms,
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(k, v) in pairs {
            map.insert(k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn cloudflare_header_wins() {
        let h = headers(&[
            ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
            ("x-real-ip", "10.0.0.3"),
            ("cf-connecting-ip", "198.51.100.4"),
        ]);
        assert_eq!(resolve_client_ip(&h, None), "198.51.100.4");
    }

    #[test]
    fn real_ip_before_forwarded_for() {
        let h = headers(&[("x-forwarded-for", "10.0.0.1"), ("x-real-ip", "10.0.0.3")]);
        assert_eq!(resolve_client_ip(&h, None), "10.0.0.3");
    }

    #[test]
    fn first_forwarded_hop_is_used() {
        let h = headers(&[("x-forwarded-for", " 203.0.113.7 , 10.0.0.2")]);
        assert_eq!(resolve_client_ip(&h, None), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        assert_eq!(resolve_client_ip(&HeaderMap::new(), Some(peer)), "192.0.2.10");
        assert_eq!(resolve_client_ip(&headers(&[("x-real-ip", " ")]), None), "unknown");
    }
}
