use chrono::Utc;
use contracts::domain::a031_article::aggregate::{Article, ArticleData, ArticleId};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::NotSet, QueryOrder, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a031_article")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub number: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    pub unit: String,
    pub kind: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Article {
    fn from(m: Model) -> Self {
        Article {
            id: ArticleId::new(m.id),
            data: ArticleData {
                number: m.number,
                name: m.name,
                description: m.description,
                price: m.price,
                currency: m.currency,
                unit: m.unit,
                kind: m.kind,
            },
            created_at: m.created_at,
            is_deleted: m.is_deleted,
        }
    }
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: ArticleId) -> Result<Option<Article>, DbErr> {
    let result = Entity::find_by_id(id.value()).one(db).await?;
    Ok(result.map(Into::into))
}

/// Поиск по артикульному номеру среди неудаленных
pub async fn find_by_number<C: ConnectionTrait>(db: &C, number: &str) -> Result<Option<Article>, DbErr> {
    let result = Entity::find()
        .filter(Column::Number.eq(number))
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Id)
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert<C: ConnectionTrait>(db: &C, data: &ArticleData) -> Result<ArticleId, DbErr> {
    let active = ActiveModel {
        id: NotSet,
        number: Set(data.number.clone()),
        name: Set(data.name.clone()),
        description: Set(data.description.clone()),
        price: Set(data.price),
        currency: Set(data.currency.clone()),
        unit: Set(data.unit.clone()),
        kind: Set(data.kind.clone()),
        created_at: Set(Utc::now()),
        is_deleted: Set(false),
    };
    let model = active.insert(db).await?;
    Ok(ArticleId::new(model.id))
}

pub async fn soft_delete<C: ConnectionTrait>(db: &C, id: ArticleId) -> Result<bool, DbErr> {
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .filter(Column::Id.eq(id.value()))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    Entity::find().count(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::memory_database;

    #[tokio::test]
    async fn test_find_by_number_ignores_deleted_articles() {
        let db = memory_database().await;
        let data = ArticleData {
            number: "SKU-1".into(),
            name: "Tasse".into(),
            unit: "Stück".into(),
            ..Default::default()
        };
        let old = insert(&db, &data).await.unwrap();
        soft_delete(&db, old).await.unwrap();
        assert!(find_by_number(&db, "SKU-1").await.unwrap().is_none());

        let new = insert(&db, &data).await.unwrap();
        let found = find_by_number(&db, "SKU-1").await.unwrap().unwrap();
        assert_eq!(found.id, new);
        assert_eq!(get_by_id(&db, new).await.unwrap().unwrap().data.unit, "Stück");
    }
}
