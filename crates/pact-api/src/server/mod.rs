use std::fmt;
use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, Command, CommandResult, CoordinatorConfig, CoordinatorStatus, ErrorCode, Event,
    OfferSnapshot, PactLinkSnapshot, SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};

use crate::CoordinatorApi;

const DEFAULT_PAGE_SIZE: usize = 500;
const MAX_PAGE_SIZE: usize = 5000;

include!("error.rs");
include!("state.rs");
include!("routes/control.rs");
include!("routes/inspect.rs");
include!("routes/stream.rs");
include!("util.rs");

pub async fn serve(addr: SocketAddr, config: CoordinatorConfig) -> Result<(), ServerError> {
    let state = AppState::new(config);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/commands", post(submit_command))
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/offers", get(get_offers))
        .route("/api/v1/pacts", get(get_pacts))
        .route("/api/v1/timeline", get(get_timeline))
        .route("/api/v1/stream", get(stream_events))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests;
