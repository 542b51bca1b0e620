use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Формат дат в фильтрах API магазина
pub const FILTER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Фильтры выборки заказов из магазина.
///
/// Известные поля типизированы, остальные передаются в запрос как есть.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Начало периода, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// Конец периода, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    /// Число или числовая строка (значения из форм)
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl OrderFilters {
    pub fn by_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    pub fn by_date_range(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            date_from: Some(from.format(FILTER_DATE_FORMAT).to_string()),
            date_to: Some(to.format(FILTER_DATE_FORMAT).to_string()),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.to_query_pairs().is_empty()
    }

    /// Пары для query string. Пустые значения и `null` не передаются,
    /// логические значения кодируются как 1/0.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        let typed = [
            ("status", self.status.clone()),
            ("date_from", self.date_from.clone()),
            ("date_to", self.date_to.clone()),
            ("limit", self.limit.map(|v| v.to_string())),
            ("page", self.page.map(|v| v.to_string())),
        ];
        for (key, value) in typed {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                pairs.push((key.to_string(), value));
            }
        }

        for (key, value) in &self.extra {
            let rendered = match value {
                Value::Null => continue,
                Value::String(s) if s.trim().is_empty() => continue,
                Value::String(s) => s.clone(),
                Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            pairs.push((key.clone(), rendered));
        }

        pairs
    }
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match super::source_order::lenient_integer(deserializer)? {
        None => Ok(None),
        Some(value) => u32::try_from(value)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a non-negative count, got {}", value))),
    }
}
