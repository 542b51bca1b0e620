use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};

/// Хранилище настроек "ключ - значение" (таблица sys_settings)
pub struct SettingsStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SettingsStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get(&self, name: &str) -> Result<Option<String>, DbErr> {
        let row = self
            .conn
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT value FROM sys_settings WHERE name = ?",
                vec![name.into()],
            ))
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("", "value")?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, name: &str, value: &str) -> Result<(), DbErr> {
        let query = r#"
            INSERT INTO sys_settings (name, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
        "#;

        self.conn
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                query,
                vec![name.into(), value.into(), Utc::now().to_rfc3339().into()],
            ))
            .await?;
        Ok(())
    }

    /// Значение или `default`, если ключ не задан или пуст
    pub async fn get_or(&self, name: &str, default: &str) -> Result<String, DbErr> {
        Ok(self
            .get(name)
            .await?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}
