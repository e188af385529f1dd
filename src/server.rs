//! HTTP front end: `POST /api/diet-pdf` takes a plan as JSON and answers
//! with the PDF.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{Assets, Error};

pub const PDF_FILENAME: &str = "diet-plan.pdf";

#[derive(Debug)]
pub enum ApiError {
    Render(Error),
    Task(tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Render(e) => log::error!("PDF generation failed: {e}"),
            ApiError::Task(e) => log::error!("PDF render task failed: {e}"),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to generate PDF" })),
        )
            .into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Render(e)
    }
}

/// GET /health
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "diet-plan-pdf"
    }))
}

/// POST /api/diet-pdf
async fn diet_pdf_handler(
    State(assets): State<Arc<Assets>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let bytes = tokio::task::spawn_blocking(move || crate::render_plan_json(&body, &assets))
        .await
        .map_err(ApiError::Task)??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{PDF_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub fn build_router(assets: Arc<Assets>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/diet-pdf", post(diet_pdf_handler))
        .with_state(assets)
}

pub async fn serve(addr: SocketAddr, assets: Assets) -> std::io::Result<()> {
    let app = build_router(Arc::new(assets));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on {addr}");
    axum::serve(listener, app).await
}
