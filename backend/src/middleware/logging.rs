use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header::CONTENT_LENGTH, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::middleware::request_id::RequestId;

const MAX_BUFFERED_BODY_BYTES: usize = 64 * 1024;
const MAX_LOGGED_BODY_BYTES: usize = 1024;

/// Logs every 4xx/5xx response with its body preview; 5xx at `error`, 4xx at
/// `warn`. The body is buffered and handed back to the caller unchanged.
pub async fn log_error_responses(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let latency_ms = start.elapsed().as_millis() as u64;
    let (mut parts, body) = response.into_parts();
    let (body, preview) = match to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => {
            let preview = preview(&bytes);
            (Body::from(bytes), preview)
        }
        Err(err) => {
            parts.headers.remove(CONTENT_LENGTH);
            (Body::empty(), format!("<unreadable body: {err}>"))
        }
    };

    let event = ErrorEvent {
        status,
        method: &method,
        uri: &uri,
        request_id: &request_id,
        latency_ms,
        body: &preview,
    };
    event.emit();

    Response::from_parts(parts, body)
}

fn preview(bytes: &Bytes) -> String {
    if bytes.len() > MAX_LOGGED_BODY_BYTES {
        format!(
            "{}... (truncated, {} bytes total)",
            String::from_utf8_lossy(&bytes[..MAX_LOGGED_BODY_BYTES]),
            bytes.len()
        )
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

struct ErrorEvent<'a> {
    status: StatusCode,
    method: &'a str,
    uri: &'a str,
    request_id: &'a str,
    latency_ms: u64,
    body: &'a str,
}

impl ErrorEvent<'_> {
    fn emit(&self) {
        let status = self.status.as_u16();
        if self.status.is_server_error() {
            tracing::error!(
                status,
                method = self.method,
                uri = self.uri,
                request_id = self.request_id,
                latency_ms = self.latency_ms,
                body = self.body,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status,
                method = self.method,
                uri = self.uri,
                request_id = self.request_id,
                latency_ms = self.latency_ms,
                body = self.body,
                "Request rejected"
            );
        }
    }
}
