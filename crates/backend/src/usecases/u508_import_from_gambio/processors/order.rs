//! Трансляция заказа магазина в заказ целевой системы. Без ввода-вывода.
//!
//! Значения по умолчанию собраны в функциях по группам полей
//! (платежный адрес, адрес доставки, суммы, метаданные заказа, позиции).

use contracts::domain::a030_address::aggregate::{AddressData, AddressId, ADDRESS_KIND_COMPANY};
use contracts::domain::a031_article::aggregate::ArticleData;
use contracts::domain::a032_sales_order::aggregate::{
    BillingFields, MonetaryTotals, SalesOrderHeader, SalesOrderLine, ShippingFields,
};
use contracts::usecases::u508_import_from_gambio::{
    GambioConfig, SourceAddress, SourceLineItem, SourceOrder,
};
use maplit::hashmap;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const DEFAULT_COUNTRY: &str = "DE";
pub const DEFAULT_CURRENCY: &str = "EUR";
pub const DEFAULT_LANGUAGE: &str = "de";
pub const DEFAULT_SHIPPING_METHOD: &str = "Standard";
pub const DEFAULT_PAYMENT_METHOD: &str = "bank transfer";
pub const DEFAULT_LINE_QUANTITY: f64 = 1.0;
pub const DEFAULT_UNIT: &str = "Stück";

pub const ORDER_STATUS_CREATED: &str = "angelegt";
pub const SALES_CHANNEL: &str = "Gambio Import";
pub const INTERNAL_NOTE: &str = "Importiert von Gambio Shop";
pub const ARTICLE_KIND: &str = "artikel";

static SHIPPING_METHODS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    hashmap! {
        "dhl" => "DHL",
        "dpd" => "DPD",
        "hermes" => "Hermes",
        "gls" => "GLS",
        "ups" => "UPS",
        "fedex" => "FedEx",
    }
});

static PAYMENT_METHODS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    hashmap! {
        "bank_transfer" => "bank transfer",
        "cash_on_delivery" => "cash on delivery",
        "credit_card" => "credit card",
        "paypal" => "PayPal",
        "klarna" => "Klarna",
        "sofort" => "instant transfer",
    }
});

/// Способ доставки магазина -> перевозчик. Регистр не важен.
pub fn map_shipping_method(code: &str) -> &'static str {
    SHIPPING_METHODS
        .get(code.trim().to_lowercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_SHIPPING_METHOD)
}

/// Способ оплаты магазина -> способ оплаты целевой системы. Регистр не важен.
pub fn map_payment_method(code: &str) -> &'static str {
    PAYMENT_METHODS
        .get(code.trim().to_lowercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_PAYMENT_METHOD)
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn country(address: &SourceAddress) -> String {
    address
        .country_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_COUNTRY)
        .to_string()
}

/// Внешняя ссылка: id заказа магазина в строковом виде
pub fn external_ref(order: &SourceOrder) -> Option<String> {
    order
        .id
        .as_ref()
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}

// ============================================================================
// Field groups
// ============================================================================

/// Платежный адрес и контакты клиента
pub fn billing_fields(order: &SourceOrder) -> BillingFields {
    let address = &order.billing_address;
    let customer = &order.customer;
    let name = address.full_name();

    BillingFields {
        customer_number: text(&customer.customer_number),
        name: name.clone(),
        department: String::new(),
        sub_department: String::new(),
        street: text(&address.street),
        address_extra: text(&address.house_number),
        contact_person: name,
        postcode: text(&address.postcode),
        city: text(&address.city),
        country: country(address),
        vat_id: text(&customer.vat_number),
        email: text(&customer.email),
        phone: text(&customer.telephone),
        fax: String::new(),
    }
}

pub fn shipping_fields(address: &SourceAddress) -> ShippingFields {
    let name = address.full_name();
    ShippingFields {
        name: name.clone(),
        department: String::new(),
        sub_department: String::new(),
        street: text(&address.street),
        address_extra: text(&address.house_number),
        contact_person: name,
        postcode: text(&address.postcode),
        city: text(&address.city),
        country: country(address),
    }
}

/// Поля доставки заполняются, только если адрес доставки задан
/// и структурно отличается от платежного
pub fn divergent_shipping(order: &SourceOrder) -> Option<ShippingFields> {
    order
        .effective_shipping_address()
        .filter(|shipping| **shipping != order.billing_address)
        .map(shipping_fields)
}

pub fn monetary_totals(order: &SourceOrder) -> MonetaryTotals {
    MonetaryTotals {
        total_gross: order.total.unwrap_or(0.0),
        total_net: order.total_net.unwrap_or(0.0),
        tax_total: order.tax.unwrap_or(0.0),
    }
}

pub fn currency(order: &SourceOrder) -> String {
    non_blank(&order.currency).unwrap_or(DEFAULT_CURRENCY).to_string()
}

pub fn language(order: &SourceOrder) -> String {
    non_blank(&order.language).unwrap_or(DEFAULT_LANGUAGE).to_string()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Данные новой адресной записи клиента
pub fn address_data(order: &SourceOrder) -> AddressData {
    let billing = billing_fields(order);
    AddressData {
        customer_number: billing.customer_number,
        name: billing.name,
        department: billing.department,
        sub_department: billing.sub_department,
        street: billing.street,
        address_extra: billing.address_extra,
        contact_person: billing.contact_person,
        postcode: billing.postcode,
        city: billing.city,
        country: billing.country,
        vat_id: billing.vat_id,
        email: billing.email,
        phone: billing.phone,
        fax: billing.fax,
        kind: ADDRESS_KIND_COMPANY.to_string(),
    }
}

/// Данные нового артикула для позиции
pub fn article_data(item: &SourceLineItem, number: String) -> ArticleData {
    ArticleData {
        number,
        name: text(&item.name),
        description: text(&item.description),
        price: item.price.unwrap_or(0.0),
        currency: DEFAULT_CURRENCY.to_string(),
        unit: DEFAULT_UNIT.to_string(),
        kind: ARTICLE_KIND.to_string(),
    }
}

// ============================================================================
// Order
// ============================================================================

pub fn to_sales_order_header(
    order: &SourceOrder,
    address_id: AddressId,
    config: &GambioConfig,
) -> SalesOrderHeader {
    let external_ref = external_ref(order).unwrap_or_default();

    SalesOrderHeader {
        project_id: config.default_project,
        subject: format!("Bestellung {}", external_ref),
        external_ref,
        processor: config.default_processor.clone(),
        free_text: text(&order.comment),
        internal_note: INTERNAL_NOTE.to_string(),
        status: ORDER_STATUS_CREATED.to_string(),
        kind: ADDRESS_KIND_COMPANY.to_string(),
        address_id,
        billing: billing_fields(order),
        shipping_method: map_shipping_method(order.shipping_method.as_deref().unwrap_or_default())
            .to_string(),
        sales_channel: SALES_CHANNEL.to_string(),
        payment_method: map_payment_method(order.payment_method.as_deref().unwrap_or_default())
            .to_string(),
        totals: monetary_totals(order),
        currency: currency(order),
        language: language(order),
        is_shop_import: true,
        shipping: divergent_shipping(order),
    }
}

/// Позиции в порядке источника, `sort` с 1
pub fn to_sales_order_lines(order: &SourceOrder, config: &GambioConfig) -> Vec<SalesOrderLine> {
    let project_id = order.project.unwrap_or(config.default_project);
    let currency = currency(order);

    order
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| SalesOrderLine {
            sort: index as i32 + 1,
            project_id,
            product_number: item.product_number().unwrap_or_default().to_string(),
            name: text(&item.name),
            description: text(&item.description),
            quantity: item.quantity.unwrap_or(DEFAULT_LINE_QUANTITY),
            unit_price: item.price.unwrap_or(0.0),
            currency: currency.clone(),
            tax: item.tax.unwrap_or(0.0),
            discount: item.discount.unwrap_or(0.0),
            unit: DEFAULT_UNIT.to_string(),
            status: ORDER_STATUS_CREATED.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(value: serde_json::Value) -> SourceOrder {
        serde_json::from_value(value).unwrap()
    }

    fn billing() -> serde_json::Value {
        json!({
            "firstname": "Erika",
            "lastname": "Mustermann",
            "street": "Hauptstraße",
            "house_number": "5a",
            "postcode": "50667",
            "city": "Köln",
            "country_code": "DE"
        })
    }

    #[test]
    fn test_vocabulary_mapping_is_case_insensitive() {
        assert_eq!(map_shipping_method("DHL"), "DHL");
        assert_eq!(map_shipping_method("dhl"), "DHL");
        assert_eq!(map_shipping_method("FedEx"), "FedEx");
        assert_eq!(map_payment_method("PayPal"), "PayPal");
        assert_eq!(map_payment_method("SOFORT"), "instant transfer");
    }

    #[test]
    fn test_unmapped_vocabulary_uses_defaults() {
        assert_eq!(map_shipping_method("carrierpigeon"), "Standard");
        assert_eq!(map_shipping_method(""), "Standard");
        assert_eq!(map_payment_method("barter"), "bank transfer");
    }

    #[test]
    fn test_header_fields() {
        let source = order(json!({
            "id": 1042,
            "customer": { "email": "erika@example.com", "customer_number": "K-77", "telephone": 221 },
            "billing_address": billing(),
            "total": 119.0,
            "total_net": "100.00",
            "comment": "Bitte klingeln",
            "shipping_method": "dpd",
            "payment_method": "paypal"
        }));
        let mut config = GambioConfig::default();
        config.default_project = 4;
        config.default_processor = "Max".into();

        let header = to_sales_order_header(&source, AddressId::new(9), &config);

        assert_eq!(header.external_ref, "1042");
        assert_eq!(header.subject, "Bestellung 1042");
        assert_eq!(header.project_id, 4);
        assert_eq!(header.processor, "Max");
        assert_eq!(header.address_id, AddressId::new(9));
        assert_eq!(header.billing.name, "Erika Mustermann");
        assert_eq!(header.billing.contact_person, "Erika Mustermann");
        assert_eq!(header.billing.address_extra, "5a");
        assert_eq!(header.billing.phone, "221");
        assert_eq!(header.billing.fax, "");
        assert_eq!(header.shipping_method, "DPD");
        assert_eq!(header.payment_method, "PayPal");
        assert_eq!(header.sales_channel, "Gambio Import");
        assert_eq!(header.internal_note, "Importiert von Gambio Shop");
        assert_eq!(header.free_text, "Bitte klingeln");
        assert_eq!(header.totals.total_gross, 119.0);
        assert_eq!(header.totals.total_net, 100.0);
        assert_eq!(header.totals.tax_total, 0.0);
        assert_eq!(header.currency, "EUR");
        assert_eq!(header.language, "de");
        assert!(header.is_shop_import);
        assert!(!header.has_divergent_shipping());
    }

    #[test]
    fn test_missing_fields_default_to_empty_and_zero() {
        let source = order(json!({ "id": "A-1" }));
        let billing = billing_fields(&source);
        assert_eq!(billing.name, "");
        assert_eq!(billing.email, "");
        assert_eq!(billing.country, DEFAULT_COUNTRY);
        assert_eq!(monetary_totals(&source), MonetaryTotals::default());
    }

    #[test]
    fn test_divergent_shipping_requires_a_different_address() {
        let absent = order(json!({ "id": 1, "billing_address": billing() }));
        assert!(divergent_shipping(&absent).is_none());

        let same = order(json!({
            "id": 1,
            "billing_address": billing(),
            "shipping_address": billing()
        }));
        assert!(divergent_shipping(&same).is_none());

        let mut other = billing();
        other["city"] = json!("Bonn");
        let different = order(json!({
            "id": 1,
            "billing_address": billing(),
            "shipping_address": other
        }));
        let shipping = divergent_shipping(&different).unwrap();
        assert_eq!(shipping.city, "Bonn");
        assert_eq!(shipping.name, "Erika Mustermann");
    }

    #[test]
    fn test_lines_are_numbered_in_source_order() {
        let source = order(json!({
            "id": 1,
            "currency": "CHF",
            "items": [
                { "product_number": "A", "quantity": 2, "price": 5.5 },
                { "product_number": "B" },
                { "name": "Versand", "tax": 0.95, "discount": "1,50" }
            ]
        }));
        let lines = to_sales_order_lines(&source, &GambioConfig::default());

        let sorts: Vec<i32> = lines.iter().map(|l| l.sort).collect();
        assert_eq!(sorts, vec![1, 2, 3]);
        assert_eq!(lines[0].product_number, "A");
        assert_eq!(lines[0].quantity, 2.0);
        assert_eq!(lines[1].quantity, DEFAULT_LINE_QUANTITY);
        assert_eq!(lines[1].unit_price, 0.0);
        assert_eq!(lines[2].product_number, "");
        assert_eq!(lines[2].discount, 1.5);
        assert!(lines.iter().all(|l| l.currency == "CHF" && l.unit == "Stück"));
    }

    #[test]
    fn test_line_project_prefers_source_project() {
        let mut config = GambioConfig::default();
        config.default_project = 3;

        let with_project = order(json!({ "id": 1, "project": "12", "items": [{}] }));
        assert_eq!(to_sales_order_lines(&with_project, &config)[0].project_id, 12);

        let without = order(json!({ "id": 1, "items": [{}] }));
        assert_eq!(to_sales_order_lines(&without, &config)[0].project_id, 3);
    }
}
