use contracts::domain::a030_address::aggregate::AddressId;
use contracts::domain::a031_article::aggregate::ArticleId;
use contracts::usecases::u508_import_from_gambio::{SourceLineItem, SourceOrder};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use super::error::{GambioError, GambioResult};
use super::processors::order;
use crate::domain::{a030_address, a031_article};

/// Префикс синтетических артикульных номеров (позиции без номера)
pub const PLACEHOLDER_ARTICLE_PREFIX: &str = "GAMBIO-AUTO-";

/// Итог подбора артикула для позиции
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleResolution {
    Found(ArticleId),
    Created(ArticleId),
    /// Создать артикул не удалось, позиция привязывается к артикулу-заглушке
    Fallback { id: ArticleId, reason: String },
}

impl ArticleResolution {
    pub fn id(&self) -> ArticleId {
        match self {
            ArticleResolution::Found(id) | ArticleResolution::Created(id) => *id,
            ArticleResolution::Fallback { id, .. } => *id,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ArticleResolution::Fallback { .. })
    }
}

pub fn placeholder_article_number() -> String {
    format!("{}{}", PLACEHOLDER_ARTICLE_PREFIX, Uuid::new_v4().simple())
}

/// Find-or-create для адресов и артикулов
pub struct EntityResolver {
    fallback_article_id: ArticleId,
}

impl EntityResolver {
    pub fn new(fallback_article_id: ArticleId) -> Self {
        Self {
            fallback_article_id,
        }
    }

    /// Адрес клиента: email -> номер клиента -> новая запись.
    /// Удаленные записи не подбираются; найденные не обновляются.
    pub async fn resolve_address<C: ConnectionTrait>(
        &self,
        db: &C,
        source: &SourceOrder,
    ) -> GambioResult<AddressId> {
        let customer = &source.customer;

        if let Some(email) = non_blank(&customer.email) {
            let found = a030_address::repository::find_by_email(db, email)
                .await
                .map_err(|e| GambioError::Resolution(format!("address lookup by email failed: {}", e)))?;
            if let Some(address) = found {
                tracing::debug!(address_id = %address.id, "Address matched by email");
                return Ok(address.id);
            }
        }

        if let Some(number) = non_blank(&customer.customer_number) {
            let found = a030_address::repository::find_by_customer_number(db, number)
                .await
                .map_err(|e| {
                    GambioError::Resolution(format!("address lookup by customer number failed: {}", e))
                })?;
            if let Some(address) = found {
                tracing::debug!(address_id = %address.id, "Address matched by customer number");
                return Ok(address.id);
            }
        }

        let id = a030_address::repository::insert(db, &order::address_data(source))
            .await
            .map_err(|e| {
                GambioError::Resolution(format!(
                    "Could not find or create address for order {}: {}",
                    source.display_id(),
                    e
                ))
            })?;
        tracing::info!(address_id = %id, order_id = %source.display_id(), "Created address");
        Ok(id)
    }

    /// Артикул позиции: поиск по номеру, иначе создание.
    /// Ошибка создания дает [`ArticleResolution::Fallback`], а не ошибку;
    /// ошибка поиска прерывает импорт заказа.
    pub async fn resolve_article<C: ConnectionTrait>(
        &self,
        db: &C,
        item: &SourceLineItem,
    ) -> GambioResult<ArticleResolution> {
        let number = match item.product_number() {
            Some(number) => {
                let found = a031_article::repository::find_by_number(db, number)
                    .await
                    .map_err(|e| GambioError::Resolution(format!("article lookup failed: {}", e)))?;
                if let Some(article) = found {
                    return Ok(ArticleResolution::Found(article.id));
                }
                number.to_string()
            }
            None => placeholder_article_number(),
        };

        match a031_article::repository::insert(db, &order::article_data(item, number)).await {
            Ok(id) => Ok(ArticleResolution::Created(id)),
            Err(e) => Ok(ArticleResolution::Fallback {
                id: self.fallback_article_id,
                reason: e.to_string(),
            }),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
