use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{RawQuery, Request, State},
    http::{HeaderMap, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::info;

use crate::handler::{UpdateHandler, UpdateRequest};

pub const FORWARDED_FOR: &str = "x-forwarded-for";

pub struct AppState {
    pub handler: UpdateHandler,
}

/// Update parameters from the query string.
///
/// Parsing never fails: unknown keys are ignored and a repeated key keeps its
/// last value, so a malformed query still reaches the handler.
#[derive(Debug, Default, PartialEq, Eq)]
struct UpdateQuery {
    hostname: Option<String>,
    token: Option<String>,
}

impl UpdateQuery {
    fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "hostname" => parsed.hostname = Some(value.into_owned()),
                "token" => parsed.token = Some(value.into_owned()),
                _ => {}
            }
        }
        parsed
    }
}

pub fn create_router(handler: UpdateHandler) -> Router {
    let state = Arc::new(AppState { handler });

    Router::new()
        .route("/update", get(update_dns))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

/// One `access` line per request: target with the token masked, the
/// forwarded client address, status and latency.
async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let target = masked_target(request.uri());
    let client = client_address(request.headers()).unwrap_or_else(|| "-".to_string());

    let response = next.run(request).await;

    info!(
        target: "access",
        "{} {} from {} -> {} in {:.3}ms",
        method,
        target,
        client,
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    response
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn update_dns(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> crate::response::Response {
    let query = UpdateQuery::parse(query.as_deref());
    let request = UpdateRequest {
        client_address: client_address(&headers),
        hostname: query.hostname,
        token: query.token,
    };

    state.handler.handle(&request).await
}

/// Left-most entry of `x-forwarded-for`, i.e. the address the proxy saw.
fn client_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
}

fn masked_target(uri: &Uri) -> String {
    match uri.query() {
        Some(q) => format!("{}?{}", uri.path(), mask_token(q)),
        None => uri.path().to_string(),
    }
}

// Keys are compared decoded, the same way `UpdateQuery::parse` sees them.
fn mask_token(query: &str) -> String {
    query
        .split('&')
        .map(|pair| {
            let key = form_urlencoded::parse(pair.as_bytes()).next().map(|(k, _)| k);
            match key.as_deref() {
                Some("token") => "token=***",
                _ => pair,
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}
