use axum::{
    routing::{get, post},
    Router,
};
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u508_import_from_gambio::ImportFromGambio;
use sea_orm::DatabaseConnection;

use crate::api::handlers::u508_import_from_gambio;

/// Общее состояние обработчиков
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    let u508 = ImportFromGambio::route_prefix();

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // UseCase u508: Import from Gambio
        // ========================================
        .route(
            &format!("{}/import", u508),
            post(u508_import_from_gambio::import),
        )
        .route(
            &format!("{}/import-order", u508),
            post(u508_import_from_gambio::import_order),
        )
        .route(
            &format!("{}/test-connection", u508),
            post(u508_import_from_gambio::test_connection),
        )
        .route(
            &format!("{}/orders", u508),
            post(u508_import_from_gambio::list_orders),
        )
        .route(
            &format!("{}/order", u508),
            post(u508_import_from_gambio::get_order),
        )
        .with_state(state)
}
