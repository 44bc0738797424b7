use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::geo::{Brand, MarkerRecord, read_markers_file};

/// Error body shape the map client expects, message text included.
#[derive(Debug, Serialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub markers_file: PathBuf,
    pub port: u16,
}

struct ServeState {
    markers_file: PathBuf,
}

/// Authorization hook for the marker endpoint. The shipped server is open;
/// deployments front it with their own gateway.
fn authorize() -> bool {
    true
}

fn router(state: Arc<ServeState>) -> Router {
    Router::new()
        .route(
            "/api/:brand",
            get(markers_handler).fallback(method_not_allowed),
        )
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> Result<()> {
    let app = router(Arc::new(ServeState {
        markers_file: config.markers_file,
    }));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!(%addr, "marker server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .await
        .context("marker server failed")
}

type HandlerError = (StatusCode, Json<ErrorMessage>);

fn error_response(status: StatusCode, message: String) -> HandlerError {
    (status, Json(ErrorMessage { message }))
}

/// GET /api/{brand}. Unknown brands are normalized to the default brand
/// rather than rejected, matching the viewer's allow-list behavior.
async fn markers_handler(
    State(state): State<Arc<ServeState>>,
    Path(brand): Path<String>,
) -> Result<Json<Vec<MarkerRecord>>, HandlerError> {
    if !authorize() {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Brak autoryzacji".to_owned(),
        ));
    }

    let brand = Brand::from_name(&brand);
    tracing::debug!(brand = brand.name(), "serving markers");

    let records = read_markers_file(&state.markers_file).map_err(|error| {
        tracing::error!(%error, "failed to load markers file");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Wystąpił błąd: {error:#}"),
        )
    })?;

    Ok(Json(records))
}

async fn method_not_allowed() -> HandlerError {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "Metoda nieobsługiwana".to_owned(),
    )
}
