use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT_ID: i64 = 1;
pub const DEFAULT_DOCUMENT_PREFIX: &str = "GAMBIO";
pub const DEFAULT_IMPORT_STATUS: &str = "pending";
pub const DEFAULT_IMPORT_LIMIT: u32 = 50;
/// Артикул-заглушка, к которому привязывается позиция, если артикул
/// не удалось создать
pub const DEFAULT_FALLBACK_ARTICLE_ID: i64 = 1;

/// Настройки подключения к магазину Gambio и параметры импорта.
///
/// Приходит в теле запросов API или собирается из хранилища настроек
/// (см. ключи [`settings_keys`]).
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GambioConfig {
    /// Базовый URL REST API, например `https://shop.example.com/api.php/v2`
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_project")]
    pub default_project: i64,
    /// Ответственный сотрудник (Bearbeiter) для созданных заказов
    #[serde(default, rename = "default_bearbeiter")]
    pub default_processor: String,
    /// Префикс номера документа (Belegnummer)
    #[serde(default = "default_prefix", rename = "belegnr_prefix")]
    pub document_prefix: String,
    #[serde(default = "default_status")]
    pub import_status: String,
    #[serde(default = "default_limit")]
    pub import_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_import_date: Option<NaiveDate>,
    #[serde(default = "default_fallback_article")]
    pub fallback_article_id: i64,
}

fn default_project() -> i64 {
    DEFAULT_PROJECT_ID
}

fn default_prefix() -> String {
    DEFAULT_DOCUMENT_PREFIX.to_string()
}

fn default_status() -> String {
    DEFAULT_IMPORT_STATUS.to_string()
}

fn default_limit() -> u32 {
    DEFAULT_IMPORT_LIMIT
}

fn default_fallback_article() -> i64 {
    DEFAULT_FALLBACK_ARTICLE_ID
}

impl Default for GambioConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            default_project: DEFAULT_PROJECT_ID,
            default_processor: String::new(),
            document_prefix: DEFAULT_DOCUMENT_PREFIX.to_string(),
            import_status: DEFAULT_IMPORT_STATUS.to_string(),
            import_limit: DEFAULT_IMPORT_LIMIT,
            last_import_date: None,
            fallback_article_id: DEFAULT_FALLBACK_ARTICLE_ID,
        }
    }
}

impl GambioConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Проверка обязательных полей. Возвращает все нарушения сразу.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let errors: Vec<String> = [
            ("base_url", &self.base_url),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| required_field_message(&format!("config.{}", name)))
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Префикс номера документа; пустая настройка означает префикс по умолчанию
    pub fn effective_document_prefix(&self) -> &str {
        let prefix = self.document_prefix.trim();
        if prefix.is_empty() {
            DEFAULT_DOCUMENT_PREFIX
        } else {
            prefix
        }
    }

    pub fn masked_password(&self) -> String {
        "*".repeat(self.password.chars().count())
    }
}

impl std::fmt::Debug for GambioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GambioConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.masked_password())
            .field("default_project", &self.default_project)
            .field("default_processor", &self.default_processor)
            .field("document_prefix", &self.document_prefix)
            .field("import_status", &self.import_status)
            .field("import_limit", &self.import_limit)
            .field("last_import_date", &self.last_import_date)
            .field("fallback_article_id", &self.fallback_article_id)
            .finish()
    }
}

pub fn required_field_message(field: &str) -> String {
    format!("Required field \"{}\" is empty.", field)
}

/// Ключи хранилища настроек (sys_settings)
pub mod settings_keys {
    pub const BASE_URL: &str = "gambio_api_url";
    pub const USERNAME: &str = "gambio_api_username";
    pub const PASSWORD: &str = "gambio_api_password";
    pub const DEFAULT_PROJECT: &str = "gambio_default_project";
    pub const DEFAULT_PROCESSOR: &str = "gambio_default_bearbeiter";
    pub const DOCUMENT_PREFIX: &str = "gambio_belegnr_prefix";
    pub const IMPORT_STATUS: &str = "gambio_import_status";
    pub const IMPORT_LIMIT: &str = "gambio_import_limit";
    pub const LAST_IMPORT_DATE: &str = "gambio_last_import_date";
    pub const FALLBACK_ARTICLE_ID: &str = "gambio_fallback_article_id";

    pub const ALL: [&str; 10] = [
        BASE_URL,
        USERNAME,
        PASSWORD,
        DEFAULT_PROJECT,
        DEFAULT_PROCESSOR,
        DOCUMENT_PREFIX,
        IMPORT_STATUS,
        IMPORT_LIMIT,
        LAST_IMPORT_DATE,
        FALLBACK_ARTICLE_ID,
    ];
}
