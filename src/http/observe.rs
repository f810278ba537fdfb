//! Response observation.
//!
//! Reads the upstream response head before the body is relayed. Never
//! changes status, headers or body.

use axum::http::Response;
use hyper::ext::ReasonPhrase;

use crate::observability::trace;

/// Status text as sent by upstream, falling back to the canonical phrase.
pub fn status_text<B>(response: &Response<B>) -> String {
    if let Some(reason) = response.extensions().get::<ReasonPhrase>() {
        return String::from_utf8_lossy(reason.as_bytes()).into_owned();
    }
    response
        .status()
        .canonical_reason()
        .unwrap_or_default()
        .to_string()
}

/// Trace lines for an upstream response.
pub fn response_trace<B>(response: &Response<B>) -> Vec<String> {
    trace::trace_lines(
        format!("{} {}", response.status().as_u16(), status_text(response)),
        response.headers(),
    )
}

/// Log the response trace when `debug` is set.
pub fn observe<B>(response: &Response<B>, debug: bool) {
    if debug {
        trace::emit(&response_trace(response));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn trace_lists_status_and_headers() {
        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header("x-test", "value")
            .header("vary", "accept")
            .header("vary", "origin")
            .body(())
            .unwrap();

        let lines = response_trace(&response);
        assert_eq!(
            lines,
            vec!["201 Created", "x-test: value", "vary: accept", "vary: origin", ""]
        );
    }

    #[test]
    fn upstream_reason_phrase_wins() {
        let mut response = Response::new(());
        *response.status_mut() = StatusCode::OK;
        response
            .extensions_mut()
            .insert(ReasonPhrase::from_static(b"Everything Fine"));

        assert_eq!(status_text(&response), "Everything Fine");
    }

    #[test]
    fn unknown_status_has_empty_text() {
        let response = Response::builder().status(599).body(()).unwrap();
        assert_eq!(status_text(&response), "");
    }

    #[test]
    fn observe_leaves_response_alone() {
        let response = Response::builder()
            .status(StatusCode::ACCEPTED)
            .header("x-test", "value")
            .body("hello")
            .unwrap();

        observe(&response, true);

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-test"], "value");
        assert_eq!(*response.body(), "hello");
    }
}
