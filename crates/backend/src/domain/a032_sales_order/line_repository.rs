use chrono::NaiveDate;
use contracts::domain::a031_article::aggregate::ArticleId;
use contracts::domain::a032_sales_order::aggregate::{
    PersistedSalesOrderLine, SalesOrderId, SalesOrderLine, SalesOrderLineId,
};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, QueryOrder, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a032_sales_order_line")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    pub article_id: i64,
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
    pub delivery_date: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PersistedSalesOrderLine {
    fn from(m: Model) -> Self {
        PersistedSalesOrderLine {
            id: SalesOrderLineId::new(m.id),
            order_id: SalesOrderId::new(m.order_id),
            article_id: ArticleId::new(m.article_id),
            delivery_date: m.delivery_date,
            line: SalesOrderLine {
                sort: m.sort,
                project_id: m.project_id,
                product_number: m.product_number,
                name: m.name,
                description: m.description,
                quantity: m.quantity,
                unit_price: m.unit_price,
                currency: m.currency,
                tax: m.tax,
                discount: m.discount,
                unit: m.unit,
                status: m.status,
            },
        }
    }
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    order_id: SalesOrderId,
    article_id: ArticleId,
    line: &SalesOrderLine,
    delivery_date: NaiveDate,
) -> Result<SalesOrderLineId, DbErr> {
    let active = ActiveModel {
        id: NotSet,
        order_id: Set(order_id.value()),
        article_id: Set(article_id.value()),
        sort: Set(line.sort),
        project_id: Set(line.project_id),
        product_number: Set(line.product_number.clone()),
        name: Set(line.name.clone()),
        description: Set(line.description.clone()),
        quantity: Set(line.quantity),
        unit_price: Set(line.unit_price),
        currency: Set(line.currency.clone()),
        tax: Set(line.tax),
        discount: Set(line.discount),
        unit: Set(line.unit.clone()),
        status: Set(line.status.clone()),
        delivery_date: Set(delivery_date),
    };
    let model = active.insert(db).await?;
    Ok(SalesOrderLineId::new(model.id))
}

/// Позиции заказа в порядке `sort`
pub async fn list_by_order<C: ConnectionTrait>(
    db: &C,
    order_id: SalesOrderId,
) -> Result<Vec<PersistedSalesOrderLine>, DbErr> {
    let items = Entity::find()
        .filter(Column::OrderId.eq(order_id.value()))
        .order_by_asc(Column::Sort)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}
