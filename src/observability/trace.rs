//! Diagnostic request/response traces.
//!
//! A trace is a head line, one line per header value, then an empty
//! separator line. Lines are built separately from emission so the
//! format can be checked without a subscriber.

use axum::http::HeaderMap;

/// Target used for trace events, filterable on its own.
pub const TRACE_TARGET: &str = "origin_relay::trace";

/// Build a trace: `head`, then `name: value` per header value, then `""`.
pub fn trace_lines(head: String, headers: &HeaderMap) -> Vec<String> {
    let mut lines = Vec::with_capacity(headers.len() + 2);
    lines.push(head);
    // HeaderMap::iter yields each value of a multi-valued header separately.
    for (name, value) in headers.iter() {
        lines.push(format!(
            "{}: {}",
            name,
            String::from_utf8_lossy(value.as_bytes())
        ));
    }
    lines.push(String::new());
    lines
}

/// Write trace lines to the log. Never fails.
pub fn emit(lines: &[String]) {
    for line in lines {
        tracing::info!(target: TRACE_TARGET, "{}", line);
    }
}
