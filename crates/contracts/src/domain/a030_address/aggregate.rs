use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ID Type
// ============================================================================
crate::integer_aggregate_id!(
    /// Идентификатор адреса (клиента) в целевой системе
    AddressId
);

/// Тип адреса, который проставляется при создании из интернет-магазина
pub const ADDRESS_KIND_COMPANY: &str = "firma";

// ============================================================================
// Aggregate
// ============================================================================

/// Адрес клиента (карточка покупателя) в целевой системе.
///
/// Поля, которых нет в источнике, хранятся пустой строкой, а не NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(flatten)]
    pub data: AddressData,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Данные адреса без технических полей (для вставки)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddressData {
    pub customer_number: String,
    pub name: String,
    pub department: String,
    pub sub_department: String,
    pub street: String,
    pub address_extra: String,
    pub contact_person: String,
    pub postcode: String,
    pub city: String,
    pub country: String,
    pub vat_id: String,
    pub email: String,
    pub phone: String,
    pub fax: String,
    pub kind: String,
}
