use chrono::{Datelike, NaiveDate, Utc};
use contracts::domain::a030_address::aggregate::AddressId;
use contracts::domain::a032_sales_order::aggregate::{
    BillingFields, MonetaryTotals, SalesOrder, SalesOrderHeader, SalesOrderId, ShippingFields,
};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a032_sales_order")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub document_no: String,
    pub document_date: NaiveDate,
    pub document_year: i32,
    pub project_id: i64,
    pub external_ref: String,
    pub processor: String,
    pub free_text: String,
    pub internal_note: String,
    pub status: String,
    pub kind: String,
    pub address_id: i64,
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
    pub subject: String,
    pub shipping_method: String,
    pub sales_channel: String,
    pub payment_method: String,
    pub total_gross: f64,
    pub total_net: f64,
    pub tax_total: f64,
    pub currency: String,
    pub language: String,
    pub is_shop_import: bool,
    pub divergent_shipping: bool,
    pub shipping_name: String,
    pub shipping_department: String,
    pub shipping_sub_department: String,
    pub shipping_street: String,
    pub shipping_address_extra: String,
    pub shipping_contact_person: String,
    pub shipping_postcode: String,
    pub shipping_city: String,
    pub shipping_country: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SalesOrder {
    fn from(m: Model) -> Self {
        let shipping = m.divergent_shipping.then(|| ShippingFields {
            name: m.shipping_name,
            department: m.shipping_department,
            sub_department: m.shipping_sub_department,
            street: m.shipping_street,
            address_extra: m.shipping_address_extra,
            contact_person: m.shipping_contact_person,
            postcode: m.shipping_postcode,
            city: m.shipping_city,
            country: m.shipping_country,
        });

        SalesOrder {
            id: SalesOrderId::new(m.id),
            document_no: m.document_no,
            document_date: m.document_date,
            created_at: m.created_at,
            header: SalesOrderHeader {
                project_id: m.project_id,
                external_ref: m.external_ref,
                processor: m.processor,
                free_text: m.free_text,
                internal_note: m.internal_note,
                status: m.status,
                kind: m.kind,
                address_id: AddressId::new(m.address_id),
                billing: BillingFields {
                    customer_number: m.customer_number,
                    name: m.name,
                    department: m.department,
                    sub_department: m.sub_department,
                    street: m.street,
                    address_extra: m.address_extra,
                    contact_person: m.contact_person,
                    postcode: m.postcode,
                    city: m.city,
                    country: m.country,
                    vat_id: m.vat_id,
                    email: m.email,
                    phone: m.phone,
                    fax: m.fax,
                },
                subject: m.subject,
                shipping_method: m.shipping_method,
                sales_channel: m.sales_channel,
                payment_method: m.payment_method,
                totals: MonetaryTotals {
                    total_gross: m.total_gross,
                    total_net: m.total_net,
                    tax_total: m.tax_total,
                },
                currency: m.currency,
                language: m.language,
                is_shop_import: m.is_shop_import,
                shipping,
            },
        }
    }
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: SalesOrderId) -> Result<Option<SalesOrder>, DbErr> {
    let result = Entity::find_by_id(id.value()).one(db).await?;
    Ok(result.map(Into::into))
}

/// Поиск по внешней ссылке. Флаг удаления не учитывается: любой заказ
/// с той же ссылкой блокирует повторный импорт.
pub async fn find_by_external_ref<C: ConnectionTrait>(
    db: &C,
    external_ref: &str,
) -> Result<Option<SalesOrder>, DbErr> {
    let result = Entity::find()
        .filter(Column::ExternalRef.eq(external_ref))
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn count_by_external_ref<C: ConnectionTrait>(db: &C, external_ref: &str) -> Result<u64, DbErr> {
    Entity::find()
        .filter(Column::ExternalRef.eq(external_ref))
        .count(db)
        .await
}

pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    Entity::find().count(db).await
}

/// Вставка шапки заказа с уже выделенным номером документа
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    header: &SalesOrderHeader,
    document_no: &str,
    document_date: NaiveDate,
) -> Result<SalesOrderId, DbErr> {
    let billing = &header.billing;
    let shipping = header.shipping.clone().unwrap_or_default();

    let active = ActiveModel {
        id: NotSet,
        document_no: Set(document_no.to_string()),
        document_date: Set(document_date),
        document_year: Set(document_date.year()),
        project_id: Set(header.project_id),
        external_ref: Set(header.external_ref.clone()),
        processor: Set(header.processor.clone()),
        free_text: Set(header.free_text.clone()),
        internal_note: Set(header.internal_note.clone()),
        status: Set(header.status.clone()),
        kind: Set(header.kind.clone()),
        address_id: Set(header.address_id.value()),
        customer_number: Set(billing.customer_number.clone()),
        name: Set(billing.name.clone()),
        department: Set(billing.department.clone()),
        sub_department: Set(billing.sub_department.clone()),
        street: Set(billing.street.clone()),
        address_extra: Set(billing.address_extra.clone()),
        contact_person: Set(billing.contact_person.clone()),
        postcode: Set(billing.postcode.clone()),
        city: Set(billing.city.clone()),
        country: Set(billing.country.clone()),
        vat_id: Set(billing.vat_id.clone()),
        email: Set(billing.email.clone()),
        phone: Set(billing.phone.clone()),
        fax: Set(billing.fax.clone()),
        subject: Set(header.subject.clone()),
        shipping_method: Set(header.shipping_method.clone()),
        sales_channel: Set(header.sales_channel.clone()),
        payment_method: Set(header.payment_method.clone()),
        total_gross: Set(header.totals.total_gross),
        total_net: Set(header.totals.total_net),
        tax_total: Set(header.totals.tax_total),
        currency: Set(header.currency.clone()),
        language: Set(header.language.clone()),
        is_shop_import: Set(header.is_shop_import),
        divergent_shipping: Set(header.has_divergent_shipping()),
        shipping_name: Set(shipping.name),
        shipping_department: Set(shipping.department),
        shipping_sub_department: Set(shipping.sub_department),
        shipping_street: Set(shipping.street),
        shipping_address_extra: Set(shipping.address_extra),
        shipping_contact_person: Set(shipping.contact_person),
        shipping_postcode: Set(shipping.postcode),
        shipping_city: Set(shipping.city),
        shipping_country: Set(shipping.country),
        created_at: Set(Utc::now()),
        is_deleted: Set(false),
    };
    let model = active.insert(db).await?;
    Ok(SalesOrderId::new(model.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::memory_database;
    use sea_orm::SqlErr;

    fn sample_header(external_ref: &str) -> SalesOrderHeader {
        SalesOrderHeader {
            project_id: 1,
            external_ref: external_ref.to_string(),
            processor: String::new(),
            free_text: String::new(),
            internal_note: String::new(),
            status: "angelegt".into(),
            kind: "firma".into(),
            address_id: AddressId::new(1),
            billing: BillingFields::default(),
            subject: format!("Bestellung {}", external_ref),
            shipping_method: "Standard".into(),
            sales_channel: "Gambio Import".into(),
            payment_method: "bank transfer".into(),
            totals: MonetaryTotals::default(),
            currency: "EUR".into(),
            language: "de".into(),
            is_shop_import: true,
            shipping: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = memory_database().await;
        let mut header = sample_header("1001");
        header.shipping = Some(ShippingFields {
            name: "Max Muster".into(),
            city: "Köln".into(),
            ..Default::default()
        });
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let id = insert(&db, &header, "GAMBIO-2024-000001", date).await.unwrap();
        let order = get_by_id(&db, id).await.unwrap().unwrap();

        assert_eq!(order.document_no, "GAMBIO-2024-000001");
        assert_eq!(order.document_date, date);
        assert_eq!(order.header, header);
        assert_eq!(
            find_by_external_ref(&db, "1001").await.unwrap().map(|o| o.id),
            Some(id)
        );
    }

    #[tokio::test]
    async fn test_external_ref_is_unique() {
        let db = memory_database().await;
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        insert(&db, &sample_header("1001"), "A-1", date).await.unwrap();

        let err = insert(&db, &sample_header("1001"), "A-2", date)
            .await
            .unwrap_err();
        assert!(matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))));
        assert_eq!(count_by_external_ref(&db, "1001").await.unwrap(), 1);
    }
}
