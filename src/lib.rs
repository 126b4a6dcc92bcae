//! Inventory admin library
//!
//! Product form, image preprocessing and searchable product table over a
//! path-addressed document store, with an HTTP surface and a CLI front end.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod screen;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::errors::ServiceError;
use crate::repositories::InventoryRepository;
use crate::services::ImagePreprocessor;
use crate::store::{DocumentStore, MemoryStore, RestStore};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repository: InventoryRepository,
    pub preprocessor: ImagePreprocessor,
}

impl AppState {
    /// Wires the configured store backend and image settings.
    pub fn from_config(config: AppConfig) -> Result<Self, ServiceError> {
        let store = build_store(&config)?;
        let preprocessor = ImagePreprocessor::new(config.image.resize_options()?);
        Ok(Self::new(config, store, preprocessor))
    }

    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        preprocessor: ImagePreprocessor,
    ) -> Self {
        Self {
            config,
            repository: InventoryRepository::new(store),
            preprocessor,
        }
    }
}

impl handlers::inventory::InventoryHandlerState for AppState {
    fn repository(&self) -> &InventoryRepository {
        &self.repository
    }

    fn preprocessor(&self) -> &ImagePreprocessor {
        &self.preprocessor
    }
}

/// Builds the document store selected by `store_backend`.
pub fn build_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, ServiceError> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Rest => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                ServiceError::InvalidInput("database_url is required for the rest backend".into())
            })?;
            let store = RestStore::new(url, config.api_key.clone(), config.request_timeout())?;
            info!(database_url = url, project_id = ?config.project_id, "Using REST document store");
            Ok(Arc::new(store))
        }
    }
}

/// Standard envelope for successful API payloads
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// API v1 routes
pub fn api_v1_routes() -> Router<AppState> {
    Router::new().nest(
        "/inventory",
        handlers::inventory::inventory_router::<AppState>(),
    )
}

/// Full application router: health, API v1, tracing and CORS.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Cross-origin access is only opened up for local development.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_development() {
        info!("Using permissive CORS for development environment");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}
