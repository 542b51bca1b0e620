use chrono::Utc;
use contracts::domain::a030_address::aggregate::{Address, AddressData, AddressId};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::NotSet, QueryOrder, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a030_address")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
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
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Address {
    fn from(m: Model) -> Self {
        Address {
            id: AddressId::new(m.id),
            data: AddressData {
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
                kind: m.kind,
            },
            created_at: m.created_at,
            is_deleted: m.is_deleted,
        }
    }
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: AddressId) -> Result<Option<Address>, DbErr> {
    let result = Entity::find_by_id(id.value()).one(db).await?;
    Ok(result.map(Into::into))
}

/// Первая неудаленная адресная запись с точно таким email
pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Address>, DbErr> {
    let result = Entity::find()
        .filter(Column::Email.eq(email))
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Id)
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

/// Первая неудаленная адресная запись с таким номером клиента
pub async fn find_by_customer_number<C: ConnectionTrait>(
    db: &C,
    customer_number: &str,
) -> Result<Option<Address>, DbErr> {
    let result = Entity::find()
        .filter(Column::CustomerNumber.eq(customer_number))
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Id)
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert<C: ConnectionTrait>(db: &C, data: &AddressData) -> Result<AddressId, DbErr> {
    let active = ActiveModel {
        id: NotSet,
        customer_number: Set(data.customer_number.clone()),
        name: Set(data.name.clone()),
        department: Set(data.department.clone()),
        sub_department: Set(data.sub_department.clone()),
        street: Set(data.street.clone()),
        address_extra: Set(data.address_extra.clone()),
        contact_person: Set(data.contact_person.clone()),
        postcode: Set(data.postcode.clone()),
        city: Set(data.city.clone()),
        country: Set(data.country.clone()),
        vat_id: Set(data.vat_id.clone()),
        email: Set(data.email.clone()),
        phone: Set(data.phone.clone()),
        fax: Set(data.fax.clone()),
        kind: Set(data.kind.clone()),
        created_at: Set(Utc::now()),
        is_deleted: Set(false),
    };
    let model = active.insert(db).await?;
    Ok(AddressId::new(model.id))
}

pub async fn soft_delete<C: ConnectionTrait>(db: &C, id: AddressId) -> Result<bool, DbErr> {
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

    fn sample(email: &str, customer_number: &str) -> AddressData {
        AddressData {
            customer_number: customer_number.into(),
            name: "Erika Mustermann".into(),
            email: email.into(),
            country: "DE".into(),
            kind: "firma".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lookups_skip_deleted_rows() {
        let db = memory_database().await;
        let deleted = insert(&db, &sample("erika@example.com", "K-1")).await.unwrap();
        assert!(soft_delete(&db, deleted).await.unwrap());

        assert!(find_by_email(&db, "erika@example.com").await.unwrap().is_none());
        assert!(find_by_customer_number(&db, "K-1").await.unwrap().is_none());

        let live = insert(&db, &sample("erika@example.com", "K-1")).await.unwrap();
        let found = find_by_email(&db, "erika@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, live);
        assert_eq!(found.data.name, "Erika Mustermann");
        assert_eq!(count(&db).await.unwrap(), 2);
    }
}
