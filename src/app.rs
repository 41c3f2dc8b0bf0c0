use axum::{
    Json, Router,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::error::CalcError;

#[derive(Debug, Deserialize)]
struct AddRequest {
    num1: i64,
    num2: i64,
}

#[derive(Debug, Serialize)]
struct AddResponse {
    result: i64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Routes of the calculation service. `/add` is kept next to `/api/add` so
/// both the bare and the prefixed URL answer.
pub fn router(static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/add", get(add_get).post(add_post))
        .route("/api/add", get(add_get).post(add_post))
        .nest_service("/static", ServeDir::new(static_dir))
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let listener = bind_first_free(
        &config.bind_host,
        config.start_port,
        config.max_port_attempts,
        Duration::from_millis(config.port_retry_delay_ms),
    )
    .await?;
    let port = listener.local_addr()?.port();

    info!("Server running on port {}", port);
    info!("Try these URLs:");
    info!("- GET: http://localhost:{}/add?num1=12&num2=6", port);
    info!("- POST: http://localhost:{}/api/add", port);
    info!("Press Ctrl-C to stop the server...");

    axum::serve(listener, router(&config.static_dir))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Bind `host:start`, moving to the next port while the current one is taken.
pub async fn bind_first_free(
    host: &str,
    start: u16,
    attempts: u16,
    retry_delay: Duration,
) -> Result<TcpListener, CalcError> {
    let mut port = start;
    for attempt in 1..=attempts {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                warn!("Port {} in use, trying next port...", port);
                if attempt < attempts {
                    tokio::time::sleep(retry_delay).await;
                }
            }
            Err(e) => return Err(e.into()),
        }
        port = match port.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }

    Err(CalcError::NoFreePort {
        start,
        end: start as u32 + attempts as u32,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl-C: {}", e);
    }
}

async fn add_get(query: Result<Query<AddRequest>, QueryRejection>) -> Response {
    match query {
        Ok(Query(request)) => add_numbers(request),
        Err(rejection) => unprocessable(rejection.body_text()),
    }
}

async fn add_post(body: Result<Json<AddRequest>, JsonRejection>) -> Response {
    match body {
        Ok(Json(request)) => add_numbers(request),
        Err(rejection) => unprocessable(rejection.body_text()),
    }
}

fn add_numbers(request: AddRequest) -> Response {
    match request.num1.checked_add(request.num2) {
        Some(result) => Json(AddResponse { result }).into_response(),
        None => unprocessable("integer overflow"),
    }
}

fn unprocessable(detail: impl Into<String>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}
