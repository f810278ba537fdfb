//! Hop-by-hop header handling.
//!
//! Connection-scoped headers are removed in both directions, along with any
//! header the `Connection` header names. A request's `TE: trailers` survives
//! so upstream gRPC-style trailers keep working.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Standard hop-by-hop headers (RFC 7230 §6.1 plus common legacy names).
const HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Check if a header is a hop-by-hop header that should not be forwarded.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Remove hop-by-hop headers from a message.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers listed in Connection are hop-by-hop for this message.
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }

    for name in HOP_HEADERS {
        headers.remove(*name);
    }
}

/// Strip a request's hop-by-hop headers, keeping `TE: trailers` if asked for.
pub fn strip_request_hop_by_hop(headers: &mut HeaderMap) {
    let wants_trailers = headers
        .get_all(header::TE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("trailers"));

    strip_hop_by_hop(headers);

    if wants_trailers {
        headers.insert(header::TE, HeaderValue::from_static("trailers"));
    }
}
