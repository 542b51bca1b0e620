use chrono::NaiveDate;
use contracts::usecases::u508_import_from_gambio::{
    GambioConfig, OrderFilters, SourceOrder, SourceOrderId,
};
use serde_json::Value;

use super::error::{GambioError, GambioResult};
use super::transport::GambioTransport;

/// Типизированный доступ к заказам магазина поверх [`GambioTransport`]
pub struct GambioApiClient {
    transport: GambioTransport,
}

impl GambioApiClient {
    pub fn new(transport: GambioTransport) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &GambioConfig) -> GambioResult<Self> {
        Ok(Self::new(GambioTransport::new(config)?))
    }

    /// Список заказов по фильтрам.
    /// Endpoint: GET /orders
    ///
    /// Ответ без поля `orders` - пустой список (с записью в лог), не ошибка.
    /// Один заказ неожиданной структуры делает ошибочным весь список;
    /// пакетный импорт разбирает заказы поштучно через [`Self::list_order_values`].
    pub async fn list_orders(&self, filters: &OrderFilters) -> GambioResult<Vec<SourceOrder>> {
        self.list_order_values(filters)
            .await?
            .iter()
            .map(|value| self.decode_order(value))
            .collect()
    }

    /// Заказы списка в виде JSON, без разбора в [`SourceOrder`]
    pub async fn list_order_values(&self, filters: &OrderFilters) -> GambioResult<Vec<Value>> {
        let mut value = self.transport.get("orders", filters.to_query_pairs()).await?;

        match value.get_mut("orders").map(Value::take) {
            Some(Value::Null) | None => {
                tracing::error!(
                    url = %self.transport.url_for("orders"),
                    "Gambio API response has no 'orders' field"
                );
                Ok(Vec::new())
            }
            Some(Value::Array(orders)) => {
                tracing::info!("Gambio API returned {} orders", orders.len());
                Ok(orders)
            }
            Some(other) => Err(self.decode_error(
                "orders",
                format!("expected an array of orders, got {}", other),
            )),
        }
    }

    /// Разбор одного заказа из ответа списка
    pub fn decode_order(&self, value: &Value) -> GambioResult<SourceOrder> {
        serde_json::from_value(value.clone()).map_err(|e| {
            self.decode_error(
                "orders",
                format!("order {}: {}", SourceOrder::id_of(value), e),
            )
        })
    }

    /// Один заказ.
    /// Endpoint: GET /orders/{id}
    ///
    /// `Ok(None)` - магазин ответил, но заказа в ответе нет.
    pub async fn get_order(&self, id: &SourceOrderId) -> GambioResult<Option<SourceOrder>> {
        // id приходит от вызывающего; '/', '?' и '#' не должны менять endpoint
        let path = format!("orders/{}", urlencoding::encode(id.as_str()));
        let value = self.transport.get(&path, Vec::new()).await?;

        match value.get("order") {
            Some(Value::Null) | None => {
                tracing::debug!(order_id = %id, "Gambio order not found");
                Ok(None)
            }
            Some(order) => {
                let order: SourceOrder =
                    serde_json::from_value(order.clone()).map_err(|e| self.decode_error(&path, e))?;
                Ok(Some(order))
            }
        }
    }

    pub async fn list_orders_by_status(&self, status: &str) -> GambioResult<Vec<SourceOrder>> {
        self.list_orders(&OrderFilters::by_status(status)).await
    }

    pub async fn list_orders_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> GambioResult<Vec<SourceOrder>> {
        self.list_orders(&OrderFilters::by_date_range(from, to)).await
    }

    pub async fn test_connection(&self) -> bool {
        self.transport.probe().await
    }

    fn decode_error(&self, path: &str, e: impl std::fmt::Display) -> GambioError {
        let url = self.transport.url_for(path);
        tracing::error!(url = %url, error = %e, "Unexpected order structure in Gambio API response");
        GambioError::Decode {
            url,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> GambioApiClient {
        let config = GambioConfig::new(server.uri(), "api", "secret");
        GambioApiClient::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_order_without_order_key_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "not found" })))
            .mount(&server)
            .await;

        let order = client(&server)
            .await
            .get_order(&SourceOrderId::from(999))
            .await
            .unwrap();
        assert!(order.is_none());
    }

    #[tokio::test]
    async fn test_get_order_returns_decoded_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/400210"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "order": { "id": 400210, "total": "19.90", "items": [{ "name": "Tasse" }] }
            })))
            .mount(&server)
            .await;

        let order = client(&server)
            .await
            .get_order(&SourceOrderId::from("400210"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.display_id(), "400210");
        assert_eq!(order.total, Some(19.9));
        assert_eq!(order.items.len(), 1);
    }

    #[tokio::test]
    async fn test_list_without_orders_key_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let orders = client(&server)
            .await
            .list_orders(&OrderFilters::default())
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_convenience_filters_become_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(query_param("status", "paid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orders": [{ "id": 1 }, { "id": "2" }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(query_param("date_from", "2024-01-01"))
            .and(query_param("date_to", "2024-01-31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orders": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let by_status = client.list_orders_by_status("paid").await.unwrap();
        assert_eq!(by_status.len(), 2);

        let by_date = client
            .list_orders_by_date_range(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )
            .await
            .unwrap();
        assert!(by_date.is_empty());
    }

    #[tokio::test]
    async fn test_http_errors_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .get_order(&SourceOrderId::from(5))
            .await
            .unwrap_err();
        assert!(matches!(err, GambioError::HttpStatus { code: 503, .. }));
    }

    #[tokio::test]
    async fn test_order_id_is_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "order": { "id": 7 } })))
            .mount(&server)
            .await;

        client(&server)
            .await
            .get_order(&SourceOrderId::from("7/items?x=1#a"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/orders/7%2Fitems%3Fx%3D1%23a");
        assert_eq!(requests[0].url.query(), None);
    }
}
