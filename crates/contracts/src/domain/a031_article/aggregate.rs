use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::integer_aggregate_id!(
    /// Идентификатор артикула (товара) в целевой системе
    ArticleId
);

/// Артикул (товар) целевой системы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    #[serde(flatten)]
    pub data: ArticleData,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArticleData {
    /// Артикульный номер. Поиск при импорте идет только по нему.
    pub number: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    pub unit: String,
    pub kind: String,
}
