//! Request rewriting.
//!
//! Only the authority changes: scheme and host come from the upstream origin,
//! path and query are kept exactly as the client sent them. Method, body and
//! end-to-end headers are untouched.

use axum::http::header::{self, HeaderValue};
use axum::http::request::Parts;
use axum::http::uri::{PathAndQuery, Uri};
use axum::http::Version;

use crate::observability::trace;
use crate::upstream::UpstreamOrigin;

/// Point the request at the upstream origin.
///
/// Cannot fail for an origin produced by `normalize`; the error exists only
/// because `Uri` construction is fallible.
pub fn rewrite(parts: &mut Parts, origin: &UpstreamOrigin) -> Result<(), axum::http::Error> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    parts.uri = Uri::builder()
        .scheme(origin.scheme().clone())
        .authority(origin.authority().clone())
        .path_and_query(path_and_query)
        .build()?;

    // The Host header is the authority on the wire.
    let host = HeaderValue::from_str(origin.authority().as_str())?;
    parts.headers.insert(header::HOST, host);

    // HTTP/2 is negotiated per upstream connection, never inherited from the client.
    parts.version = Version::HTTP_11;

    Ok(())
}

/// Trace lines for a request as received from the client.
pub fn request_trace(parts: &Parts) -> Vec<String> {
    trace::trace_lines(
        format!("{} {} {:?}", parts.method, parts.uri, parts.version),
        &parts.headers,
    )
}

/// Log the request trace. Call before `rewrite`.
pub fn trace_request(parts: &Parts) {
    trace::emit(&request_trace(parts));
}
