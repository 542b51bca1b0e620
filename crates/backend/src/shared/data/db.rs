use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};

/// Открывает (и при необходимости создает) файл SQLite и готовит схему
pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<DatabaseConnection> {
    let db_file = db_path.unwrap_or("target/db/gambio_sync.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    ensure_schema(&conn).await?;
    Ok(conn)
}

/// Минимальный bootstrap схемы: таблицы создаются, если их нет
pub async fn ensure_schema<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    ensure_table(
        conn,
        "sys_settings",
        r#"
        CREATE TABLE sys_settings (
            name TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL DEFAULT '',
            updated_at TEXT
        );
        "#,
    )
    .await?;

    ensure_table(
        conn,
        "a030_address",
        r#"
        CREATE TABLE a030_address (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_number TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            department TEXT NOT NULL DEFAULT '',
            sub_department TEXT NOT NULL DEFAULT '',
            street TEXT NOT NULL DEFAULT '',
            address_extra TEXT NOT NULL DEFAULT '',
            contact_person TEXT NOT NULL DEFAULT '',
            postcode TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            country TEXT NOT NULL DEFAULT '',
            vat_id TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            fax TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .await?;

    ensure_table(
        conn,
        "a031_article",
        r#"
        CREATE TABLE a031_article (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            price REAL NOT NULL DEFAULT 0,
            currency TEXT NOT NULL DEFAULT '',
            unit TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .await?;

    ensure_table(
        conn,
        "a032_sales_order",
        r#"
        CREATE TABLE a032_sales_order (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_no TEXT NOT NULL,
            document_date TEXT NOT NULL,
            document_year INTEGER NOT NULL,
            project_id INTEGER NOT NULL,
            external_ref TEXT NOT NULL,
            processor TEXT NOT NULL DEFAULT '',
            free_text TEXT NOT NULL DEFAULT '',
            internal_note TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL DEFAULT '',
            address_id INTEGER NOT NULL,
            customer_number TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            department TEXT NOT NULL DEFAULT '',
            sub_department TEXT NOT NULL DEFAULT '',
            street TEXT NOT NULL DEFAULT '',
            address_extra TEXT NOT NULL DEFAULT '',
            contact_person TEXT NOT NULL DEFAULT '',
            postcode TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            country TEXT NOT NULL DEFAULT '',
            vat_id TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            fax TEXT NOT NULL DEFAULT '',
            subject TEXT NOT NULL DEFAULT '',
            shipping_method TEXT NOT NULL DEFAULT '',
            sales_channel TEXT NOT NULL DEFAULT '',
            payment_method TEXT NOT NULL DEFAULT '',
            total_gross REAL NOT NULL DEFAULT 0,
            total_net REAL NOT NULL DEFAULT 0,
            tax_total REAL NOT NULL DEFAULT 0,
            currency TEXT NOT NULL DEFAULT '',
            language TEXT NOT NULL DEFAULT '',
            is_shop_import INTEGER NOT NULL DEFAULT 0,
            divergent_shipping INTEGER NOT NULL DEFAULT 0,
            shipping_name TEXT NOT NULL DEFAULT '',
            shipping_department TEXT NOT NULL DEFAULT '',
            shipping_sub_department TEXT NOT NULL DEFAULT '',
            shipping_street TEXT NOT NULL DEFAULT '',
            shipping_address_extra TEXT NOT NULL DEFAULT '',
            shipping_contact_person TEXT NOT NULL DEFAULT '',
            shipping_postcode TEXT NOT NULL DEFAULT '',
            shipping_city TEXT NOT NULL DEFAULT '',
            shipping_country TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .await?;

    ensure_table(
        conn,
        "a032_sales_order_line",
        r#"
        CREATE TABLE a032_sales_order_line (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL,
            article_id INTEGER NOT NULL,
            sort INTEGER NOT NULL,
            project_id INTEGER NOT NULL,
            product_number TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            quantity REAL NOT NULL DEFAULT 0,
            unit_price REAL NOT NULL DEFAULT 0,
            currency TEXT NOT NULL DEFAULT '',
            tax REAL NOT NULL DEFAULT 0,
            discount REAL NOT NULL DEFAULT 0,
            unit TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            delivery_date TEXT NOT NULL
        );
        "#,
    )
    .await?;

    ensure_table(
        conn,
        "a032_document_sequence",
        r#"
        CREATE TABLE a032_document_sequence (
            project_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            last_value INTEGER NOT NULL,
            PRIMARY KEY (project_id, year)
        );
        "#,
    )
    .await?;

    // Ключ идемпотентности уникален глобально, номер документа - в рамках проекта и года
    for ddl in [
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_a032_sales_order_external_ref ON a032_sales_order (external_ref);",
        "DROP INDEX IF EXISTS idx_a032_sales_order_document_no;",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_a032_sales_order_project_document_no ON a032_sales_order (project_id, document_year, document_no);",
        "CREATE INDEX IF NOT EXISTS idx_a032_sales_order_line_order ON a032_sales_order_line (order_id, sort);",
        "CREATE INDEX IF NOT EXISTS idx_a030_address_email ON a030_address (email);",
        "CREATE INDEX IF NOT EXISTS idx_a031_article_number ON a031_article (number);",
    ] {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            ddl.to_string(),
        ))
        .await?;
    }

    Ok(())
}

async fn ensure_table<C: ConnectionTrait>(conn: &C, name: &str, ddl: &str) -> Result<(), DbErr> {
    let exists = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
            vec![name.into()],
        ))
        .await?
        .is_some();

    if !exists {
        tracing::info!("Creating {} table", name);
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            ddl.to_string(),
        ))
        .await?;
    }
    Ok(())
}

/// In-memory база для тестов. Одно соединение в пуле: у каждого
/// соединения SQLite `:memory:` своя база.
#[cfg(test)]
pub async fn memory_database() -> DatabaseConnection {
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options)
        .await
        .expect("in-memory sqlite");
    ensure_schema(&conn).await.expect("schema bootstrap");
    conn
}
