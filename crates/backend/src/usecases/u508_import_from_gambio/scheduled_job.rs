use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use contracts::usecases::u508_import_from_gambio::config::{
    settings_keys, DEFAULT_DOCUMENT_PREFIX, DEFAULT_FALLBACK_ARTICLE_ID, DEFAULT_IMPORT_LIMIT,
    DEFAULT_IMPORT_STATUS, DEFAULT_PROJECT_ID,
};
use contracts::usecases::u508_import_from_gambio::filters::FILTER_DATE_FORMAT;
use contracts::usecases::u508_import_from_gambio::{GambioConfig, ImportResult, OrderFilters};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use std::str::FromStr;

use super::executor::ImportExecutor;
use crate::shared::data::settings::SettingsStore;
use crate::system::scheduler::ScheduledJob;

/// Собирает [`GambioConfig`] из хранилища настроек.
/// Нечисловые значения заменяются значениями по умолчанию.
pub async fn load_config<C: ConnectionTrait>(db: &C) -> Result<GambioConfig> {
    let store = SettingsStore::new(db);
    let yesterday = Utc::now().date_naive() - Duration::days(1);

    let last_import_date = match store.get(settings_keys::LAST_IMPORT_DATE).await? {
        Some(value) if !value.trim().is_empty() => {
            NaiveDate::parse_from_str(value.trim(), FILTER_DATE_FORMAT).unwrap_or_else(|e| {
                tracing::warn!(
                    "Invalid {} '{}': {}, using yesterday",
                    settings_keys::LAST_IMPORT_DATE,
                    value,
                    e
                );
                yesterday
            })
        }
        _ => yesterday,
    };

    Ok(GambioConfig {
        base_url: store.get_or(settings_keys::BASE_URL, "").await?,
        username: store.get_or(settings_keys::USERNAME, "").await?,
        password: store.get_or(settings_keys::PASSWORD, "").await?,
        default_project: parse_or(
            &store.get_or(settings_keys::DEFAULT_PROJECT, "").await?,
            settings_keys::DEFAULT_PROJECT,
            DEFAULT_PROJECT_ID,
        ),
        default_processor: store.get_or(settings_keys::DEFAULT_PROCESSOR, "").await?,
        document_prefix: store
            .get_or(settings_keys::DOCUMENT_PREFIX, DEFAULT_DOCUMENT_PREFIX)
            .await?,
        import_status: store
            .get_or(settings_keys::IMPORT_STATUS, DEFAULT_IMPORT_STATUS)
            .await?,
        import_limit: parse_or(
            &store.get_or(settings_keys::IMPORT_LIMIT, "").await?,
            settings_keys::IMPORT_LIMIT,
            DEFAULT_IMPORT_LIMIT,
        ),
        last_import_date: Some(last_import_date),
        fallback_article_id: parse_or(
            &store.get_or(settings_keys::FALLBACK_ARTICLE_ID, "").await?,
            settings_keys::FALLBACK_ARTICLE_ID,
            DEFAULT_FALLBACK_ARTICLE_ID,
        ),
    })
}

fn parse_or<T: FromStr + Copy>(value: &str, key: &str, default: T) -> T {
    if value.trim().is_empty() {
        return default;
    }
    value.trim().parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid value '{}' for {}, using default", value, key);
        default
    })
}

/// Фильтры планового запуска: статус, лимит и дата последнего импорта
pub fn job_filters(config: &GambioConfig) -> OrderFilters {
    OrderFilters {
        status: Some(config.import_status.clone()),
        limit: Some(config.import_limit),
        date_from: config
            .last_import_date
            .map(|d| d.format(FILTER_DATE_FORMAT).to_string()),
        ..Default::default()
    }
}

/// Один проход планового импорта.
///
/// Дата последнего импорта сдвигается на сегодня, только если список
/// заказов удалось получить.
pub async fn run_import(db: &DatabaseConnection) -> Result<ImportResult> {
    let config = load_config(db).await?;
    let filters = job_filters(&config);
    tracing::info!(
        status = %config.import_status,
        limit = config.import_limit,
        date_from = ?filters.date_from,
        "Starting scheduled Gambio import"
    );

    let executor = ImportExecutor::from_config(db.clone(), config)?;
    let result = executor.import_batch(&filters).await;

    if result.is_fetch_failure() {
        tracing::warn!(
            "Gambio order list could not be fetched, {} is not updated",
            settings_keys::LAST_IMPORT_DATE
        );
    } else {
        let today = Utc::now().date_naive().format(FILTER_DATE_FORMAT).to_string();
        SettingsStore::new(db)
            .set(settings_keys::LAST_IMPORT_DATE, &today)
            .await?;
    }

    Ok(result)
}

/// Плановый импорт заказов из Gambio для [`crate::system::scheduler::ScheduledJobWorker`]
pub struct GambioImportJob {
    db: DatabaseConnection,
}

impl GambioImportJob {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScheduledJob for GambioImportJob {
    fn name(&self) -> &'static str {
        "u508_import_from_gambio"
    }

    async fn run(&self) -> Result<()> {
        let result = run_import(&self.db).await?;
        if let Some(fetch_error) = result.errors.iter().find(|e| e.order_id.is_none()) {
            anyhow::bail!("Gambio import failed: {}", fetch_error.error);
        }
        Ok(())
    }
}
