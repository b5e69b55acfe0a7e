use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use subforge::layout::EstimatedMeasure;
use subforge::{convert_to_styled, preview_line, Canvas, StyleParams};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Deserialize)]
struct ConvertRequest {
    srt: String,
    style: Option<StyleParams>,
}

#[derive(Serialize)]
struct ConvertResponse {
    ass: String,
}

#[derive(Deserialize)]
struct PreviewRequest {
    ass: String,
    line: String,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Defaults applied to requests that leave out a style.
struct AppState {
    style: StyleParams,
}

async fn convert_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConvertRequest>,
) -> impl IntoResponse {
    let style = payload.style.unwrap_or_else(|| state.style.clone());
    match convert_to_styled(&payload.srt, &style) {
        Ok(ass) => (StatusCode::OK, Json(ConvertResponse { ass })).into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn preview_handler(Json(payload): Json<PreviewRequest>) -> impl IntoResponse {
    let canvas = Canvas {
        width: payload.width.unwrap_or(subforge::document::DEFAULT_PLAY_RES_X),
        height: payload.height.unwrap_or(subforge::document::DEFAULT_PLAY_RES_Y),
    };
    let placement = preview_line(
        &payload.ass,
        &payload.line,
        canvas,
        &EstimatedMeasure::default(),
    );
    (StatusCode::OK, Json(placement))
}

pub async fn start_server(port: u16, style: StyleParams) -> anyhow::Result<()> {
    let state = Arc::new(AppState { style });

    let app = Router::new()
        .route("/api/convert", post(convert_handler))
        .route("/api/preview", post(preview_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
