use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};

/// Следующий номер в последовательности документов (project, year).
///
/// Одна атомарная команда: счетчик создается при первом обращении и
/// инкрементируется при последующих. Первое значение продолжает нумерацию
/// уже сохраненных заказов этого проекта и года.
pub async fn next_value<C: ConnectionTrait>(db: &C, project_id: i64, year: i32) -> Result<i64, DbErr> {
    let query = r#"
        INSERT INTO a032_document_sequence (project_id, year, last_value)
        VALUES (
            ?, ?,
            (SELECT COUNT(*) FROM a032_sales_order WHERE project_id = ? AND document_year = ?) + 1
        )
        ON CONFLICT(project_id, year) DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
    "#;

    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            query,
            vec![
                project_id.into(),
                year.into(),
                project_id.into(),
                year.into(),
            ],
        ))
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("a032_document_sequence".to_string()))?;

    row.try_get("", "last_value")
}

/// `{prefix}-{year}-{sequence:06}`
pub fn format_document_no(prefix: &str, year: i32, sequence: i64) -> String {
    format!("{}-{}-{:06}", prefix, year, sequence)
}
