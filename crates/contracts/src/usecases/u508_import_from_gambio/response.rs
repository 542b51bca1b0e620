use serde::{Deserialize, Serialize};

use super::source_order::{SourceOrder, SourceOrderId};

/// Итог пакетного импорта. Не сохраняется, возвращается вызывающему.
///
/// Для ошибок по конкретному заказу `order_id` заполнен; ошибка получения
/// списка заказов из магазина записывается без `order_id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub total: i32,
    pub imported: i32,
    pub skipped: i32,
    pub errors: Vec<ImportErrorEntry>,
    /// Позиции, привязанные к артикулу-заглушке
    #[serde(default)]
    pub fallback_lines: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportErrorEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub error: String,
}

impl ImportResult {
    /// Результат пакета, для которого не удалось получить список заказов
    pub fn fetch_failed(message: impl std::fmt::Display) -> Self {
        Self {
            errors: vec![ImportErrorEntry {
                order_id: None,
                error: format!("API request failed: {}", message),
            }],
            ..Default::default()
        }
    }

    pub fn record_order_error(&mut self, order_id: impl Into<String>, error: impl Into<String>) {
        self.errors.push(ImportErrorEntry {
            order_id: Some(order_id.into()),
            error: error.into(),
        });
    }

    /// Количество ошибок по конкретным заказам
    pub fn order_error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.order_id.is_some()).count()
    }

    pub fn is_fetch_failure(&self) -> bool {
        self.errors.iter().any(|e| e.order_id.is_none())
    }

    /// `total == imported + skipped + ошибки по заказам`
    pub fn is_balanced(&self) -> bool {
        self.total as usize
            == self.imported as usize + self.skipped as usize + self.order_error_count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOrderResponse {
    pub imported: bool,
    pub order_id: SourceOrderId,
    pub message: String,
}

impl ImportOrderResponse {
    pub fn new(order_id: SourceOrderId, imported: bool) -> Self {
        let message = if imported {
            "Order imported successfully"
        } else {
            "Order already imported"
        };
        Self {
            imported,
            order_id,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConnectionResponse {
    pub connected: bool,
    pub message: String,
}

impl TestConnectionResponse {
    pub fn new(connected: bool) -> Self {
        let message = if connected {
            "Connection successful"
        } else {
            "Connection failed"
        };
        Self {
            connected,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<SourceOrder>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order: SourceOrder,
}
