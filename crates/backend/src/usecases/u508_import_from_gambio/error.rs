use contracts::usecases::common::UseCaseError;
use thiserror::Error;

pub type GambioResult<T> = Result<T, GambioError>;

/// Ошибки импорта из Gambio
#[derive(Debug, Error)]
pub enum GambioError {
    /// Не заполнены обязательные поля запроса/настроек
    #[error("{}", .0.join(" "))]
    Validation(Vec<String>),

    /// Соединение, таймаут, TLS
    #[error("Gambio API request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Gambio API request to {url} failed with HTTP {code}: {body}")]
    HttpStatus { url: String, code: u16, body: String },

    /// Ответ не является корректным JSON ожидаемой формы
    #[error("Invalid JSON response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Order {0} not found in Gambio")]
    NotFound(String),

    #[error("Entity resolution failed: {0}")]
    Resolution(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl GambioError {
    /// Ошибка на стороне магазина или канала связи с ним
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            GambioError::Transport { .. } | GambioError::HttpStatus { .. } | GambioError::Decode { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GambioError::Validation(_) => "validation",
            GambioError::Transport { .. } => "transport",
            GambioError::HttpStatus { .. } => "http_status",
            GambioError::Decode { .. } => "decode",
            GambioError::NotFound(_) => "not_found",
            GambioError::Resolution(_) => "resolution",
            GambioError::Persistence(_) => "persistence",
        }
    }
}

impl From<GambioError> for UseCaseError {
    fn from(err: GambioError) -> Self {
        match err {
            GambioError::Validation(errors) => UseCaseError::validation(errors),
            GambioError::NotFound(_) => UseCaseError::not_found(err.to_string()),
            ref e if e.is_transport_failure() => {
                UseCaseError::external("Gambio API request failed").with_details(e.to_string())
            }
            other => UseCaseError::internal(other.to_string()),
        }
    }
}
