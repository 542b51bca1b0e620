use serde::{Deserialize, Serialize};

use super::config::{required_field_message, GambioConfig};
use super::filters::OrderFilters;
use super::source_order::SourceOrderId;

/// Запрос на пакетный импорт (и на выборку заказов без импорта)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub config: GambioConfig,
    #[serde(default)]
    pub filters: OrderFilters,
}

impl ImportRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        self.config.validate()
    }
}

/// Запрос по одному заказу магазина
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SingleOrderRequest {
    #[serde(default)]
    pub config: GambioConfig,
    #[serde(default)]
    pub order_id: Option<SourceOrderId>,
}

impl SingleOrderRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = self.config.validate().err().unwrap_or_default();
        if self.order_id.as_ref().map_or(true, |id| id.is_empty()) {
            errors.push(required_field_message("order_id"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Запрос на проверку подключения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionRequest {
    #[serde(default)]
    pub config: GambioConfig,
}
