use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::a030_address::aggregate::AddressId;
use crate::domain::a031_article::aggregate::ArticleId;

// ============================================================================
// ID Types
// ============================================================================
crate::integer_aggregate_id!(
    /// Идентификатор заказа (Auftrag) в целевой системе
    SalesOrderId
);

crate::integer_aggregate_id!(
    /// Идентификатор позиции заказа
    SalesOrderLineId
);

// ============================================================================
// Header
// ============================================================================

/// Шапка заказа в форме целевой схемы - результат трансляции заказа магазина.
///
/// Номер документа и даты сюда не входят: они назначаются при записи.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderHeader {
    pub project_id: i64,
    /// Идентификатор заказа во внешнем магазине (ключ идемпотентности)
    pub external_ref: String,
    pub processor: String,
    pub free_text: String,
    pub internal_note: String,
    pub status: String,
    pub kind: String,
    pub address_id: AddressId,
    #[serde(flatten)]
    pub billing: BillingFields,
    pub subject: String,
    pub shipping_method: String,
    pub sales_channel: String,
    pub payment_method: String,
    #[serde(flatten)]
    pub totals: MonetaryTotals,
    pub currency: String,
    pub language: String,
    /// Признак "заказ из интернет-магазина"
    pub is_shop_import: bool,
    /// Заполняется только при отличающемся адресе доставки
    pub shipping: Option<ShippingFields>,
}

impl SalesOrderHeader {
    pub fn has_divergent_shipping(&self) -> bool {
        self.shipping.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BillingFields {
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
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShippingFields {
    pub name: String,
    pub department: String,
    pub sub_department: String,
    pub street: String,
    pub address_extra: String,
    pub contact_person: String,
    pub postcode: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonetaryTotals {
    pub total_gross: f64,
    pub total_net: f64,
    pub tax_total: f64,
}

/// Сохраненный заказ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: SalesOrderId,
    /// Номер документа вида `{prefix}-{year}-{000001}`
    pub document_no: String,
    pub document_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub header: SalesOrderHeader,
}

// ============================================================================
// Lines
// ============================================================================

/// Позиция заказа в форме целевой схемы (до привязки к артикулу)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    /// Порядковый номер, начиная с 1, в порядке позиций источника
    pub sort: i32,
    pub project_id: i64,
    pub product_number: String,
    pub name: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub currency: String,
    pub tax: f64,
    pub discount: f64,
    pub unit: String,
    pub status: String,
}

/// Сохраненная позиция заказа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSalesOrderLine {
    pub id: SalesOrderLineId,
    pub order_id: SalesOrderId,
    pub article_id: ArticleId,
    pub delivery_date: NaiveDate,
    #[serde(flatten)]
    pub line: SalesOrderLine,
}
