use serde::{Deserialize, Serialize};

/// Ошибка выполнения UseCase (тело ответа API при неуспехе)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Список нарушений (для VALIDATION_ERROR)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl UseCaseError {
    pub const VALIDATION: &'static str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &'static str = "NOT_FOUND";
    pub const INTERNAL: &'static str = "INTERNAL_ERROR";
    pub const EXTERNAL: &'static str = "EXTERNAL_ERROR";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            errors: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn validation(errors: Vec<String>) -> Self {
        let mut err = Self::new(Self::VALIDATION, "Validation failed");
        err.errors = errors;
        err
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Self::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }

    /// Ошибка внешней системы (магазин недоступен, вернул ошибку и т.п.)
    pub fn external(message: impl Into<String>) -> Self {
        Self::new(Self::EXTERNAL, message)
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        if !self.errors.is_empty() {
            write!(f, " ({})", self.errors.join(" "))?;
        }
        Ok(())
    }
}

impl std::error::Error for UseCaseError {}

impl From<anyhow::Error> for UseCaseError {
    fn from(err: anyhow::Error) -> Self {
        UseCaseError::internal(err.to_string())
    }
}
