//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::api::{self, ApiDoc};
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::rendering::SvgRenderer;
use crate::services::{
    ColorNormalizer, ExportService, Ghostscript, PdfPageRenderer, ProfileRegistry, RsvgConvert,
    SvgRasterizer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub profiles: Arc<ProfileRegistry>,
    pub export_service: Arc<ExportService>,
}

/// Create application state with the process-backed external converters.
pub fn create_app_state(config: AppConfig) -> AppState {
    let profiles = ProfileRegistry::shared(&config.profiles_dir);
    if let Some(reason) = profiles.default_error() {
        tracing::warn!(%reason, "Default ICC profile missing; PDF/X exports will fail");
    }

    let rasterizer = Arc::new(RsvgConvert::new(config.tools.rsvg_convert.clone()));
    let ghostscript = Arc::new(Ghostscript::new(config.tools.ghostscript.clone()));
    create_app_state_with(config, profiles, rasterizer, ghostscript.clone(), ghostscript)
}

/// Create application state from explicit collaborators.
pub fn create_app_state_with(
    config: AppConfig,
    profiles: Arc<ProfileRegistry>,
    rasterizer: Arc<dyn SvgRasterizer>,
    normalizer: Arc<dyn ColorNormalizer>,
    page_renderer: Arc<dyn PdfPageRenderer>,
) -> AppState {
    let config = Arc::new(config);
    let export_service = Arc::new(ExportService::new(
        config.clone(),
        profiles.clone(),
        Arc::new(SvgRenderer::new()),
        rasterizer,
        normalizer,
        page_renderer,
    ));

    AppState {
        config,
        profiles,
        export_service,
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/convert", post(handle_convert))
        .route("/health", get(api::handle_health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // The export panel runs on a different origin.
        .layer(CorsLayer::permissive())
}

// Wrapper handler to extract state components for the underlying API handler

async fn handle_convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    api::handle_convert(
        State(state.config),
        State(state.export_service),
        multipart,
    )
    .await
}
