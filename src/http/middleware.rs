use crate::clock::SharedClock;
use crate::health::format_uptime;
use crate::request_id::{ensure_trace_id, IdGenerator, RequestId, REQUEST_ID_HEADER};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Attach a correlation id to every request and echo it on the response
pub async fn trace_requests(
    State(ids): State<Arc<dyn IdGenerator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let incoming = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok());
    let id = ensure_trace_id(incoming, ids.as_ref());

    let header_value = match HeaderValue::from_str(&id) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(target: "access", "Request id {:?} is not a valid header value", id);
            None
        }
    };
    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }
    request.extensions_mut().insert(RequestId(id));

    let mut response = next.run(request).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Log one line per completed request under the `access` component
pub async fn access_log(State(clock): State<SharedClock>, request: Request, next: Next) -> Response {
    let start = clock.now();

    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    let elapsed = (clock.now() - start).to_std().unwrap_or(Duration::ZERO);
    info!(
        target: "access",
        "{}",
        access_line(
            &request_id,
            &method,
            response.status(),
            &path,
            &remote,
            &user_agent,
            elapsed
        )
    );

    response
}

/// `<request-id> <METHOD> <status> <path[?query]> <remote> <user-agent> <elapsed>`
pub fn access_line(
    request_id: &str,
    method: &Method,
    status: StatusCode,
    path: &str,
    remote: &str,
    user_agent: &str,
    elapsed: Duration,
) -> String {
    format!(
        "{} {} {} {} {} {} {}",
        request_id,
        method,
        status.as_u16(),
        path,
        remote,
        user_agent,
        format_uptime(elapsed)
    )
}
