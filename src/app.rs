use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::ItemRepository;
use crate::services::{health_service, items_service, recognition_service};
use crate::services::{PlaceholderRecognizer, Recognizer};

/// Handles shared by every request, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub items: ItemRepository,
    pub recognizer: Arc<dyn Recognizer>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_recognizer(pool, Arc::new(PlaceholderRecognizer))
    }

    pub fn with_recognizer(pool: SqlitePool, recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            items: ItemRepository::new(pool),
            recognizer,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .route("/health", get(health_service::check))
        .route(
            "/items",
            get(items_service::list_items).post(items_service::create_item),
        )
        .route(
            "/items/:id",
            get(items_service::get_item)
                .patch(items_service::update_item)
                .delete(items_service::delete_item),
        )
        .route("/items/:id/export", get(items_service::export_item))
        .route("/recognize", post(recognition_service::recognize))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
