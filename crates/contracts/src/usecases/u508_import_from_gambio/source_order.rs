//! Заказ в том виде, в каком его отдает REST API магазина Gambio.
//!
//! Разбор сделан терпимым к типичным для PHP-магазина вольностям:
//! id и номера приходят то строкой, то числом, суммы - строками,
//! вместо пустых объектов встречается `null`.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Order id
// ============================================================================

/// Идентификатор заказа в магазине. Всегда хранится строкой.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceOrderId(String);

impl SourceOrderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for SourceOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for SourceOrderId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for SourceOrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for SourceOrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s.trim().to_string())),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(de::Error::custom(format!(
                "order id must be a string or a number, got {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Order
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceOrder {
    #[serde(default)]
    pub id: Option<SourceOrderId>,
    #[serde(default, deserialize_with = "default_on_null")]
    pub customer: SourceCustomer,
    #[serde(default, deserialize_with = "default_on_null")]
    pub billing_address: SourceAddress,
    #[serde(default)]
    pub shipping_address: Option<SourceAddress>,
    #[serde(default, deserialize_with = "default_on_null")]
    pub items: Vec<SourceLineItem>,

    /// Сумма брутто
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_net: Option<f64>,
    /// Сумма налога
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub shipping_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_method: Option<String>,
    /// Проект, в контексте которого заказ создан в магазине
    #[serde(default, deserialize_with = "lenient_integer")]
    pub project: Option<i64>,

    /// Любые дополнительные поля магазина - сохраняются для отдачи через API
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SourceOrder {
    /// Id заказа из сырого JSON (до разбора) для отчета об ошибках
    pub fn id_of(value: &Value) -> String {
        match value.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "unknown".to_string(),
        }
    }

    /// Id в строковом виде для логов и отчета об ошибках
    pub fn display_id(&self) -> String {
        self.id
            .as_ref()
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Адрес доставки, если он указан и не пустой
    pub fn effective_shipping_address(&self) -> Option<&SourceAddress> {
        self.shipping_address.as_ref().filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceCustomer {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    /// Номер клиента в магазине
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vat_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub telephone: Option<String>,
}

/// Фрагмент адреса (платежный или адрес доставки).
///
/// Сравнение структурное: адрес доставки "отличается", если отличается
/// хотя бы одно поле.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceAddress {
    #[serde(default, deserialize_with = "lenient_string")]
    pub firstname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub house_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub postcode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country_code: Option<String>,
}

impl SourceAddress {
    pub fn is_empty(&self) -> bool {
        [
            &self.firstname,
            &self.lastname,
            &self.street,
            &self.house_number,
            &self.postcode,
            &self.city,
            &self.country_code,
        ]
        .iter()
        .all(|f| f.as_deref().map(str::trim).unwrap_or_default().is_empty())
    }

    /// "Имя Фамилия"
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.firstname.as_deref().unwrap_or_default(),
            self.lastname.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceLineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub quantity: Option<f64>,
    /// Цена за единицу
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub discount: Option<f64>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SourceLineItem {
    /// Артикульный номер, если он задан и не пустой
    pub fn product_number(&self) -> Option<&str> {
        self.product_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Lenient deserializers
// ============================================================================

fn default_on_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Строка или число -> строка; пустое значение -> None
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(if b { "1" } else { "0" }.to_string())),
        other => Err(de::Error::custom(format!("expected a string, got {}", other))),
    }
}

/// Число или числовая строка ("12.50", "12,50") -> f64.
/// Нечисловые строки трактуются как отсутствие значения.
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => Ok(s.trim().replace(',', ".").parse::<f64>().ok()),
        other => Err(de::Error::custom(format!("expected an amount, got {}", other))),
    }
}

pub(crate) fn lenient_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_i64()),
        Value::String(s) => Ok(s.trim().parse::<i64>().ok()),
        other => Err(de::Error::custom(format!("expected an integer, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_and_string_ids_are_both_strings() {
        let a: SourceOrder = serde_json::from_value(json!({ "id": 1042 })).unwrap();
        let b: SourceOrder = serde_json::from_value(json!({ "id": "1042" })).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.unwrap().as_str(), "1042");
    }

    #[test]
    fn test_amounts_accept_numeric_strings() {
        let order: SourceOrder = serde_json::from_value(json!({
            "id": 1,
            "total": "119,00",
            "total_net": 100,
            "tax": null,
            "items": [{ "product_number": 4711, "quantity": "2", "price": "abc" }]
        }))
        .unwrap();

        assert_eq!(order.total, Some(119.0));
        assert_eq!(order.total_net, Some(100.0));
        assert_eq!(order.tax, None);
        assert_eq!(order.items[0].product_number(), Some("4711"));
        assert_eq!(order.items[0].quantity, Some(2.0));
        assert_eq!(order.items[0].price, None);
    }

    #[test]
    fn test_null_fragments_fall_back_to_empty() {
        let order: SourceOrder = serde_json::from_value(json!({
            "id": 7,
            "customer": null,
            "billing_address": null,
            "items": null
        }))
        .unwrap();

        assert_eq!(order.customer, SourceCustomer::default());
        assert!(order.billing_address.is_empty());
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_empty_shipping_address_counts_as_absent() {
        let order: SourceOrder = serde_json::from_value(json!({
            "id": 7,
            "shipping_address": { "firstname": "", "city": "  " }
        }))
        .unwrap();

        assert!(order.shipping_address.is_some());
        assert!(order.effective_shipping_address().is_none());
    }

    #[test]
    fn test_unknown_fields_survive_a_roundtrip() {
        let order: SourceOrder = serde_json::from_value(json!({
            "id": 7,
            "status": "pending",
            "purchase_date": "2024-03-01 10:00:00"
        }))
        .unwrap();

        assert_eq!(order.extra["status"], json!("pending"));
        let back = serde_json::to_value(&order).unwrap();
        assert_eq!(back["purchase_date"], json!("2024-03-01 10:00:00"));
    }

    #[test]
    fn test_text_fields_accept_numbers() {
        let order: SourceOrder = serde_json::from_value(json!({
            "id": 2,
            "comment": 42,
            "shipping_method": null,
            "items": [{ "name": 12345, "description": true }]
        }))
        .unwrap();

        assert_eq!(order.comment.as_deref(), Some("42"));
        assert_eq!(order.shipping_method, None);
        assert_eq!(order.items[0].name.as_deref(), Some("12345"));
        assert_eq!(order.items[0].description.as_deref(), Some("1"));
    }

    #[test]
    fn test_id_of_raw_order() {
        assert_eq!(SourceOrder::id_of(&json!({ "id": 17 })), "17");
        assert_eq!(SourceOrder::id_of(&json!({ "id": " A-17 " })), "A-17");
        assert_eq!(SourceOrder::id_of(&json!({ "id": "" })), "unknown");
        assert_eq!(SourceOrder::id_of(&json!({ "id": [1] })), "unknown");
        assert_eq!(SourceOrder::id_of(&json!("not an order")), "unknown");
    }

    #[test]
    fn test_display_id_for_missing_identifier() {
        let order = SourceOrder::default();
        assert_eq!(order.display_id(), "unknown");
    }
}
