use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::api::{self, AppState};
use crate::batch::RegionStore;
use crate::config::{CityScienceConfig, ServerConfig};
use crate::generation::GeminiClient;
use crate::weather::WeatherApiClient;

/// Routes, static fallback and layers around `state`
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router()
        .with_state(state)
        .fallback_service(ServeDir::new(&server.static_dir))
        .layer(RequestBodyLimitLayer::new(server.body_limit_kb * 1024))
        .layer(cors)
}

pub async fn run(config: CityScienceConfig) -> anyhow::Result<()> {
    let weather = WeatherApiClient::new(&config.weather, config.weather_api_key()?)
        .context("Failed to create weather client")?;
    let generator = GeminiClient::new(&config.generation, config.generation_api_key()?)
        .context("Failed to create generation client")?;

    let state = AppState::new(
        weather,
        Arc::new(generator),
        RegionStore::new(&config.batch.regions_file),
        PathBuf::from(&config.server.output_html),
    );
    let app = app(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app).await.context("Web server failed")?;
    Ok(())
}
