use axum::{extract::State, http::StatusCode, Json};
use contracts::usecases::common::UseCaseError;
use contracts::usecases::u508_import_from_gambio::{
    ConnectionRequest, ImportOrderResponse, ImportRequest, ImportResult, OrderResponse,
    OrdersResponse, SingleOrderRequest, SourceOrderId, TestConnectionResponse,
};

use crate::routes::AppState;
use crate::usecases::u508_import_from_gambio::{GambioApiClient, GambioError, ImportExecutor};

pub type ApiError = (StatusCode, Json<UseCaseError>);

/// Ошибка импорта -> HTTP статус и тело [`UseCaseError`]
pub fn error_response(err: GambioError) -> ApiError {
    let status = match &err {
        GambioError::Validation(_) => StatusCode::BAD_REQUEST,
        GambioError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_transport_failure() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(kind = err.kind(), "u508 request failed: {}", err);
    }
    (status, Json(err.into()))
}

fn validated(result: Result<(), Vec<String>>) -> Result<(), ApiError> {
    result.map_err(|errors| error_response(GambioError::Validation(errors)))
}

fn order_id(request: &SingleOrderRequest) -> SourceOrderId {
    request.order_id.clone().unwrap_or_else(|| SourceOrderId::new(""))
}

/// POST /api/u508/import
pub async fn import(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResult>, ApiError> {
    validated(request.validate())?;
    let executor = ImportExecutor::from_config(state.db.clone(), request.config).map_err(error_response)?;
    Ok(Json(executor.import_batch(&request.filters).await))
}

/// POST /api/u508/import-order
pub async fn import_order(
    State(state): State<AppState>,
    Json(request): Json<SingleOrderRequest>,
) -> Result<Json<ImportOrderResponse>, ApiError> {
    validated(request.validate())?;
    let order_id = order_id(&request);
    let executor = ImportExecutor::from_config(state.db.clone(), request.config).map_err(error_response)?;
    let imported = executor.import_by_id(&order_id).await.map_err(error_response)?;
    Ok(Json(ImportOrderResponse::new(order_id, imported)))
}

/// POST /api/u508/test-connection
pub async fn test_connection(
    Json(request): Json<ConnectionRequest>,
) -> Result<Json<TestConnectionResponse>, ApiError> {
    validated(request.config.validate())?;
    let client = GambioApiClient::from_config(&request.config).map_err(error_response)?;
    Ok(Json(TestConnectionResponse::new(client.test_connection().await)))
}

/// POST /api/u508/orders
pub async fn list_orders(Json(request): Json<ImportRequest>) -> Result<Json<OrdersResponse>, ApiError> {
    validated(request.validate())?;
    let client = GambioApiClient::from_config(&request.config).map_err(error_response)?;
    let orders = client
        .list_orders(&request.filters)
        .await
        .map_err(error_response)?;
    Ok(Json(OrdersResponse {
        count: orders.len(),
        orders,
    }))
}

/// POST /api/u508/order
pub async fn get_order(Json(request): Json<SingleOrderRequest>) -> Result<Json<OrderResponse>, ApiError> {
    validated(request.validate())?;
    let order_id = order_id(&request);
    let client = GambioApiClient::from_config(&request.config).map_err(error_response)?;
    let order = client
        .get_order(&order_id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| error_response(GambioError::NotFound(order_id.to_string())))?;
    Ok(Json(OrderResponse { order }))
}
