use contracts::usecases::u508_import_from_gambio::GambioConfig;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

use super::error::{GambioError, GambioResult};

/// Таймаут запроса к REST API магазина
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Параметры запроса: query string или JSON-тело
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Query(Vec<(String, String)>),
    Json(Value),
}

/// HTTP-клиент REST API Gambio: Basic-аутентификация, JSON,
/// классификация ошибок. Повторов не делает.
pub struct GambioTransport {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl GambioTransport {
    pub fn new(config: &GambioConfig) -> GambioResult<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: &GambioConfig, timeout: Duration) -> GambioResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GambioError::Transport {
                url: config.base_url.clone(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str, query: Vec<(String, String)>) -> GambioResult<Value> {
        let payload = if query.is_empty() {
            Payload::None
        } else {
            Payload::Query(query)
        };
        self.request(Method::GET, path, payload).await
    }

    /// Выполнить запрос и разобрать ответ как JSON
    pub async fn request(&self, method: Method, path: &str, payload: Payload) -> GambioResult<Value> {
        let url = self.url_for(path);

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        builder = match &payload {
            Payload::None => builder,
            Payload::Query(pairs) => builder.query(pairs),
            Payload::Json(body) => builder.json(body),
        };

        tracing::debug!(method = %method, url = %url, "Gambio API request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    format!("request timed out: {}", e)
                } else {
                    e.to_string()
                };
                tracing::error!(url = %url, error = %message, "Gambio API request failed");
                return Err(GambioError::Transport { url, message });
            }
        };

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(url = %url, status = status.as_u16(), error = %e, "Failed to read Gambio API response");
            GambioError::Transport {
                url: url.clone(),
                message: format!("failed to read response body: {}", e),
            }
        })?;

        if !status.is_success() {
            tracing::error!(
                url = %url,
                status = status.as_u16(),
                body = %body,
                "Gambio API request failed"
            );
            return Err(GambioError::HttpStatus {
                url,
                code: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<Value>(&body).map_err(|e| {
            tracing::error!(
                url = %url,
                status = status.as_u16(),
                body = %body,
                error = %e,
                "Failed to parse Gambio API response"
            );
            GambioError::Decode {
                url,
                message: e.to_string(),
            }
        })
    }

    /// Проверка доступности: минимальный запрос списка заказов.
    /// Любая ошибка превращается в `false`.
    pub async fn probe(&self) -> bool {
        match self
            .get("orders", vec![("limit".to_string(), "1".to_string())])
            .await
        {
            Ok(value) => value.get("orders").map_or(false, |orders| !orders.is_null()),
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Gambio connection test failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> GambioConfig {
        GambioConfig::new(format!("{}/api.php/v2/", server.uri()), "api", "secret")
    }

    #[tokio::test]
    async fn test_request_sends_basic_auth_and_json_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api.php/v2/orders"))
            .and(basic_auth("api", "secret"))
            .and(header("accept", "application/json"))
            .and(query_param("status", "pending"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orders": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = GambioTransport::new(&config(&server)).unwrap();
        let value = transport
            .get("/orders", vec![("status".into(), "pending".into())])
            .await
            .unwrap();
        assert_eq!(value, json!({ "orders": [] }));
    }

    #[tokio::test]
    async fn test_http_error_keeps_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let transport = GambioTransport::new(&config(&server)).unwrap();
        match transport.get("orders", vec![]).await {
            Err(GambioError::HttpStatus { code, body, url }) => {
                assert_eq!(code, 500);
                assert_eq!(body, "boom");
                assert!(url.ends_with("/api.php/v2/orders"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops"))
            .mount(&server)
            .await;

        let transport = GambioTransport::new(&config(&server)).unwrap();
        let err = transport.get("orders", vec![]).await.unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn test_probe_is_false_on_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let transport = GambioTransport::new(&config(&server)).unwrap();
        assert!(!transport.probe().await);
    }

    #[tokio::test]
    async fn test_probe_is_false_on_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"orders\": ["))
            .mount(&server)
            .await;

        let transport = GambioTransport::new(&config(&server)).unwrap();
        assert!(!transport.probe().await);
    }

    #[tokio::test]
    async fn test_probe_is_false_on_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "orders": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let transport =
            GambioTransport::with_timeout(&config(&server), Duration::from_millis(50)).unwrap();
        assert!(!transport.probe().await);

        let err = transport.get("orders", vec![]).await.unwrap_err();
        assert!(err.is_transport_failure());
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn test_probe_requests_a_single_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api.php/v2/orders"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orders": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = GambioTransport::new(&config(&server)).unwrap();
        assert!(transport.probe().await);
    }

    #[tokio::test]
    async fn test_json_payload_is_sent_as_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api.php/v2/orders/7/status"))
            .and(body_json(json!({ "statusId": 3 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = GambioTransport::new(&config(&server)).unwrap();
        let value = transport
            .request(Method::PUT, "orders/7/status", Payload::Json(json!({ "statusId": 3 })))
            .await
            .unwrap();
        assert_eq!(value["success"], json!(true));
    }
}
