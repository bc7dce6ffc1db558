//! HTTP facade: forecast publishing, cached payload reads and static assets.

use anyhow::Context;
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    FetchError, LatestValueCache, config::ServerSettings, gateway::PublishGateway, query,
};

/// Shared state for all handlers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: Arc<PublishGateway>,
    pub cache: LatestValueCache,
}

/// Handler error, rendered as a 500 with the error text as a plain-text body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "forecast request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    pub city: String,
}

fn json(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Response, ApiError> {
    let publication = state.gateway.publish_forecast(&params.city).await?;
    Ok(json(publication.payload))
}

async fn get_data(State(state): State<AppState>) -> Response {
    json(query::latest(&state.cache))
}

/// Build the application router. Unmatched paths fall through to files under `settings.static_dir`.
pub fn router(state: AppState, settings: &ServerSettings) -> Router {
    Router::new()
        .route("/api/weather", get(get_weather))
        .route("/data", get(get_data))
        .fallback_service(ServeDir::new(&settings.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: AppState, settings: &ServerSettings) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", settings.host, settings.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("web server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router(state, settings)).await?;
    Ok(())
}
