use chrono::{Datelike, NaiveDate, Utc};
use contracts::domain::a031_article::aggregate::ArticleId;
use contracts::domain::a032_sales_order::aggregate::SalesOrderId;
use contracts::usecases::u508_import_from_gambio::config::required_field_message;
use contracts::usecases::u508_import_from_gambio::{
    GambioConfig, ImportResult, OrderFilters, SourceOrder, SourceOrderId,
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, SqlErr, TransactionTrait};

use super::error::{GambioError, GambioResult};
use super::gambio_api_client::GambioApiClient;
use super::processors::order;
use super::resolver::{ArticleResolution, EntityResolver};
use crate::domain::a032_sales_order::{line_repository, repository, sequence};

/// Итог импорта одного заказа
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Imported {
        order_id: SalesOrderId,
        document_no: String,
        /// Позиции, привязанные к артикулу-заглушке
        fallback_lines: usize,
    },
    /// Заказ с такой внешней ссылкой уже есть
    Skipped,
}

enum PersistError {
    /// Параллельный импорт успел записать тот же заказ
    Duplicate,
    Failed(GambioError),
}

impl From<GambioError> for PersistError {
    fn from(err: GambioError) -> Self {
        PersistError::Failed(err)
    }
}

fn persistence(e: DbErr) -> GambioError {
    GambioError::Persistence(e.to_string())
}

/// Нарушение уникальности внешней ссылки заказа
pub fn is_external_ref_conflict(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(message)) if message.contains("external_ref")
    )
}

/// Executor для UseCase импорта заказов из Gambio
pub struct ImportExecutor {
    api_client: GambioApiClient,
    resolver: EntityResolver,
    db: DatabaseConnection,
    config: GambioConfig,
}

impl ImportExecutor {
    pub fn new(
        api_client: GambioApiClient,
        resolver: EntityResolver,
        db: DatabaseConnection,
        config: GambioConfig,
    ) -> Self {
        Self {
            api_client,
            resolver,
            db,
            config,
        }
    }

    /// Проверяет настройки и собирает клиент и resolver по ним
    pub fn from_config(db: DatabaseConnection, config: GambioConfig) -> GambioResult<Self> {
        config.validate().map_err(GambioError::Validation)?;
        let api_client = GambioApiClient::from_config(&config)?;
        let resolver = EntityResolver::new(ArticleId::new(config.fallback_article_id));
        Ok(Self::new(api_client, resolver, db, config))
    }

    pub fn api_client(&self) -> &GambioApiClient {
        &self.api_client
    }

    pub async fn test_connection(&self) -> bool {
        self.api_client.test_connection().await
    }

    /// Импорт пакета. Список заказов запрашивается один раз; ошибка по
    /// одному заказу (включая неразбираемую структуру) записывается в
    /// результат и не останавливает остальные.
    pub async fn import_batch(&self, filters: &OrderFilters) -> ImportResult {
        let orders = match self.api_client.list_order_values(filters).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(kind = e.kind(), "Gambio API request failed: {}", e);
                return ImportResult::fetch_failed(e);
            }
        };

        let mut result = ImportResult {
            total: orders.len() as i32,
            ..Default::default()
        };

        for raw in &orders {
            let outcome = match self.api_client.decode_order(raw) {
                Ok(source) => self.import_order(&source).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(ImportOutcome::Imported { fallback_lines, .. }) => {
                    result.imported += 1;
                    result.fallback_lines += fallback_lines as i32;
                }
                Ok(ImportOutcome::Skipped) => result.skipped += 1,
                Err(e) => {
                    let order_id = SourceOrder::id_of(raw);
                    tracing::error!(
                        order_id = %order_id,
                        kind = e.kind(),
                        "Gambio import error: {}",
                        e
                    );
                    result.record_order_error(order_id, e.to_string());
                }
            }
        }

        tracing::info!(
            total = result.total,
            imported = result.imported,
            skipped = result.skipped,
            errors = result.errors.len(),
            fallback_lines = result.fallback_lines,
            "Gambio import finished"
        );
        result
    }

    /// `true` - заказ создан, `false` - он уже был импортирован
    pub async fn import_one(&self, source: &SourceOrder) -> GambioResult<bool> {
        match self.import_order(source).await? {
            ImportOutcome::Imported { .. } => Ok(true),
            ImportOutcome::Skipped => Ok(false),
        }
    }

    /// Запросить заказ в магазине и импортировать его
    pub async fn import_by_id(&self, id: &SourceOrderId) -> GambioResult<bool> {
        let source = self
            .api_client
            .get_order(id)
            .await?
            .ok_or_else(|| GambioError::NotFound(id.to_string()))?;
        self.import_one(&source).await
    }

    pub async fn import_order(&self, source: &SourceOrder) -> GambioResult<ImportOutcome> {
        let external_ref = order::external_ref(source)
            .ok_or_else(|| GambioError::Validation(vec![required_field_message("order.id")]))?;

        if let Some(existing) = repository::find_by_external_ref(&self.db, &external_ref)
            .await
            .map_err(persistence)?
        {
            tracing::info!(
                order_id = %external_ref,
                sales_order_id = %existing.id,
                "Gambio order already imported"
            );
            return Ok(ImportOutcome::Skipped);
        }

        let today = Utc::now().date_naive();
        let txn = self.db.begin().await.map_err(persistence)?;

        match self.persist(&txn, source, today).await {
            Ok(outcome) => {
                txn.commit().await.map_err(persistence)?;
                if let ImportOutcome::Imported {
                    order_id,
                    document_no,
                    ..
                } = &outcome
                {
                    tracing::info!(
                        order_id = %external_ref,
                        sales_order_id = %order_id,
                        document_no = %document_no,
                        "Gambio order imported successfully"
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!(order_id = %external_ref, "Rollback failed: {}", rollback);
                }
                match e {
                    PersistError::Duplicate => {
                        tracing::info!(
                            order_id = %external_ref,
                            "Gambio order was imported concurrently, skipping"
                        );
                        Ok(ImportOutcome::Skipped)
                    }
                    PersistError::Failed(e) => Err(e),
                }
            }
        }
    }

    /// Подбор сущностей и запись заказа с позициями в рамках транзакции
    async fn persist(
        &self,
        txn: &DatabaseTransaction,
        source: &SourceOrder,
        today: NaiveDate,
    ) -> Result<ImportOutcome, PersistError> {
        let address_id = self.resolver.resolve_address(txn, source).await?;
        let header = order::to_sales_order_header(source, address_id, &self.config);
        let lines = order::to_sales_order_lines(source, &self.config);

        let mut articles = Vec::with_capacity(lines.len());
        let mut fallback_lines = 0;
        for (line, item) in lines.iter().zip(&source.items) {
            let resolution = self.resolver.resolve_article(txn, item).await?;
            if let ArticleResolution::Fallback { id, reason } = &resolution {
                fallback_lines += 1;
                tracing::warn!(
                    target: "gambio::fallback_article",
                    order_id = %header.external_ref,
                    position = line.sort,
                    article_id = %id,
                    reason = %reason,
                    "Article could not be created, line attached to fallback article"
                );
            }
            articles.push(resolution.id());
        }

        let year = today.year();
        let number = sequence::next_value(txn, header.project_id, year)
            .await
            .map_err(persistence)?;
        let document_no =
            sequence::format_document_no(self.config.effective_document_prefix(), year, number);

        let order_id = match repository::insert(txn, &header, &document_no, today).await {
            Ok(id) => id,
            Err(e) if is_external_ref_conflict(&e) => return Err(PersistError::Duplicate),
            Err(e) => {
                return Err(GambioError::Persistence(format!(
                    "Failed to create order {}: {}",
                    header.external_ref, e
                ))
                .into())
            }
        };

        for (line, article_id) in lines.iter().zip(articles) {
            line_repository::insert(txn, order_id, article_id, line, today)
                .await
                .map_err(persistence)?;
        }

        Ok(ImportOutcome::Imported {
            order_id,
            document_no,
            fallback_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{a030_address, a031_article};
    use crate::shared::data::db::memory_database;
    use contracts::domain::a030_address::aggregate::AddressId;
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(value: serde_json::Value) -> SourceOrder {
        serde_json::from_value(value).unwrap()
    }

    fn sample_order(id: i64) -> SourceOrder {
        source(json!({
            "id": id,
            "customer": { "email": "erika@example.com", "customer_number": "K-1" },
            "billing_address": { "firstname": "Erika", "lastname": "Mustermann", "city": "Köln" },
            "items": [
                { "product_number": "SKU-1", "name": "Tasse", "quantity": 2, "price": 4.5 },
                { "product_number": "SKU-2", "name": "Teller", "price": 7 },
                { "name": "Gravur", "price": 3 }
            ],
            "total": 21.9,
            "shipping_method": "dhl"
        }))
    }

    async fn executor(db: &DatabaseConnection, server: &MockServer, config: GambioConfig) -> ImportExecutor {
        let config = GambioConfig {
            base_url: server.uri(),
            username: "api".into(),
            password: "secret".into(),
            ..config
        };
        ImportExecutor::from_config(db.clone(), config).unwrap()
    }

    async fn execute(db: &DatabaseConnection, sql: &str) {
        db.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_any_request() {
        let db = memory_database().await;
        let err = ImportExecutor::from_config(db, GambioConfig::default())
            .err()
            .unwrap();
        match err {
            GambioError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        let executor = executor(&db, &server, GambioConfig::default()).await;

        let order = sample_order(1042);
        assert!(executor.import_one(&order).await.unwrap());
        assert!(!executor.import_one(&order).await.unwrap());
        assert_eq!(repository::count_by_external_ref(&db, "1042").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persisted_order_and_lines() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        let executor = executor(&db, &server, GambioConfig::default()).await;

        let outcome = executor.import_order(&sample_order(7)).await.unwrap();
        let ImportOutcome::Imported { order_id, document_no, fallback_lines } = outcome else {
            panic!("order was not imported");
        };
        let year = Utc::now().year();
        assert_eq!(document_no, format!("GAMBIO-{}-000001", year));
        assert_eq!(fallback_lines, 0);

        let stored = repository::get_by_id(&db, order_id).await.unwrap().unwrap();
        assert_eq!(stored.header.external_ref, "7");
        assert_eq!(stored.header.shipping_method, "DHL");
        assert_eq!(stored.header.totals.total_gross, 21.9);
        assert_eq!(stored.header.billing.name, "Erika Mustermann");

        let lines = line_repository::list_by_order(&db, order_id).await.unwrap();
        let sorts: Vec<i32> = lines.iter().map(|l| l.line.sort).collect();
        assert_eq!(sorts, vec![1, 2, 3]);
        assert_eq!(lines[0].line.quantity, 2.0);
        assert_eq!(lines[1].line.quantity, 1.0);
        assert_eq!(a031_article::repository::count(&db).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_third_order_of_project_gets_sequence_three() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        let mut config = GambioConfig::default();
        config.default_project = 7;
        let executor = executor(&db, &server, config).await;

        let mut last = String::new();
        for id in 1..=3 {
            if let ImportOutcome::Imported { document_no, .. } =
                executor.import_order(&sample_order(id)).await.unwrap()
            {
                last = document_no;
            }
        }
        assert_eq!(last, format!("GAMBIO-{}-000003", Utc::now().year()));
    }

    #[tokio::test]
    async fn test_article_creation_failure_uses_fallback() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        let mut config = GambioConfig::default();
        config.fallback_article_id = 99;
        let executor = executor(&db, &server, config).await;
        execute(&db, "DROP TABLE a031_article").await;

        let order = source(json!({ "id": 5, "items": [{ "name": "Gravur" }] }));
        let outcome = executor.import_order(&order).await.unwrap();
        let ImportOutcome::Imported { order_id, fallback_lines, .. } = outcome else {
            panic!("order was not imported");
        };
        assert_eq!(fallback_lines, 1);

        let lines = line_repository::list_by_order(&db, order_id).await.unwrap();
        assert_eq!(lines[0].article_id, ArticleId::new(99));
    }

    #[tokio::test]
    async fn test_failure_mid_persist_rolls_back_the_order() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        let executor = executor(&db, &server, GambioConfig::default()).await;
        execute(&db, "DROP TABLE a032_sales_order_line").await;

        let err = executor.import_one(&sample_order(8)).await.unwrap_err();
        assert_eq!(err.kind(), "persistence");
        assert_eq!(repository::count(&db).await.unwrap(), 0);
        assert_eq!(a030_address::repository::count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_external_ref_conflict_detection() {
        let db = memory_database().await;
        let header = order::to_sales_order_header(
            &sample_order(1),
            AddressId::new(1),
            &GambioConfig::default(),
        );
        let date = Utc::now().date_naive();
        repository::insert(&db, &header, "X-1", date).await.unwrap();

        let conflict = repository::insert(&db, &header, "X-2", date).await.unwrap_err();
        assert!(is_external_ref_conflict(&conflict));

        let mut other = header.clone();
        other.external_ref = "2".into();
        let number_clash = repository::insert(&db, &other, "X-1", date).await.unwrap_err();
        assert!(!is_external_ref_conflict(&number_clash));
    }

    #[tokio::test]
    async fn test_batch_isolates_order_failures() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orders": [
                    { "id": 1, "customer": { "email": "a@example.com" } },
                    { "id": 2, "customer": { "email": "b@example.com" } },
                    { "customer": { "email": "c@example.com" } }
                ]
            })))
            .mount(&server)
            .await;
        let executor = executor(&db, &server, GambioConfig::default()).await;
        executor.import_one(&sample_order(2)).await.unwrap();

        let result = executor.import_batch(&OrderFilters::by_status("pending")).await;

        assert_eq!(result.total, 3);
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.order_error_count(), 1);
        assert_eq!(result.errors[0].order_id.as_deref(), Some("unknown"));
        assert!(result.is_balanced());
    }

    #[tokio::test]
    async fn test_batch_keeps_going_after_a_malformed_order() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orders": [
                    { "id": 1 },
                    { "id": 2, "items": [{ "name": "Tasse", "quantity": { "value": 2 } }] },
                    { "id": 3, "items": [{ "name": 12345 }] }
                ]
            })))
            .mount(&server)
            .await;
        let executor = executor(&db, &server, GambioConfig::default()).await;

        let result = executor.import_batch(&OrderFilters::default()).await;

        assert!(!result.is_fetch_failure());
        assert_eq!(result.total, 3);
        assert_eq!(result.imported, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].order_id.as_deref(), Some("2"));
        assert!(result.is_balanced());
        assert_eq!(repository::count_by_external_ref(&db, "1").await.unwrap(), 1);
        assert_eq!(repository::count_by_external_ref(&db, "3").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_same_prefix_in_two_projects() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        let year = Utc::now().year();

        for (project, order_id) in [(7, 1), (8, 2)] {
            let mut config = GambioConfig::default();
            config.default_project = project;
            let executor = executor(&db, &server, config).await;

            let outcome = executor.import_order(&sample_order(order_id)).await.unwrap();
            let ImportOutcome::Imported { document_no, .. } = outcome else {
                panic!("order {} was not imported", order_id);
            };
            assert_eq!(document_no, format!("GAMBIO-{}-000001", year));
        }
        assert_eq!(repository::count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_batch_fetch_failure_is_a_single_error() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;
        let executor = executor(&db, &server, GambioConfig::default()).await;

        let result = executor.import_batch(&OrderFilters::default()).await;
        assert_eq!(result.total, 0);
        assert_eq!(result.imported, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.is_fetch_failure());
        assert!(result.errors[0].error.starts_with("API request failed:"));
    }

    #[tokio::test]
    async fn test_import_by_id_reports_missing_order() {
        let db = memory_database().await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "not found" })))
            .mount(&server)
            .await;
        let executor = executor(&db, &server, GambioConfig::default()).await;

        let err = executor
            .import_by_id(&SourceOrderId::from(999))
            .await
            .unwrap_err();
        assert!(matches!(err, GambioError::NotFound(id) if id == "999"));
    }
}
