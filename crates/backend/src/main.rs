#![allow(
    clippy::useless_format,
    clippy::too_many_arguments,
    clippy::derivable_impls
)]

pub mod api;
pub mod domain;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

use clap::{Parser, Subcommand};
use contracts::usecases::u508_import_from_gambio::config::settings_keys;
use contracts::usecases::u508_import_from_gambio::{GambioConfig, OrderFilters};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use std::process::ExitCode;

use shared::data::settings::SettingsStore;
use usecases::u508_import_from_gambio::{scheduled_job, GambioApiClient};

/// Синхронизация заказов интернет-магазина Gambio
#[derive(Debug, Parser)]
#[command(name = "gambio-sync", version, about)]
struct Cli {
    /// Путь к config.toml (по умолчанию - рядом с исполняемым файлом)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// HTTP API и (если включен) плановый импорт
    Serve,
    /// Один проход планового импорта
    Run,
    /// Проверка подключения к магазину
    Test,
    /// Настройки импорта в хранилище настроек
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Показать текущие настройки (пароль скрыт)
    Show,
    /// Записать значение настройки
    Set { name: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    system::tracing::initialize()?;

    let config = match &cli.config {
        Some(path) => shared::config::load_config_from(path)?,
        None => shared::config::load_config()?,
    };
    let db_path = shared::config::get_database_path(&config)?;
    let db = shared::data::db::initialize_database(Some(&db_path.to_string_lossy())).await?;

    match cli.command {
        Command::Serve => serve(db, config).await,
        Command::Run => run_once(&db).await,
        Command::Test => test_connection(&db).await,
        Command::Config { action } => match action {
            ConfigAction::Show => show_settings(&db).await,
            ConfigAction::Set { name, value } => set_setting(&db, &name, &value).await,
        },
    }
}

async fn serve(db: DatabaseConnection, config: shared::config::Config) -> anyhow::Result<ExitCode> {
    use axum::http::{header, Method};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    if config.scheduler.enabled {
        let job = std::sync::Arc::new(scheduled_job::GambioImportJob::new(db.clone()));
        let worker = system::scheduler::ScheduledJobWorker::new(job, &config.scheduler.cron, 30)?;
        tokio::spawn(async move { worker.run_loop().await });
    } else {
        tracing::info!("Scheduled import is disabled");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = routes::configure_routes(routes::AppState { db })
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    addr.port()
                );
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

async fn run_once(db: &DatabaseConnection) -> anyhow::Result<ExitCode> {
    let result = match scheduled_job::run_import(db).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Import failed: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    println!(
        "Imported: {}, skipped: {}, errors: {} (of {})",
        result.imported,
        result.skipped,
        result.errors.len(),
        result.total
    );
    for entry in &result.errors {
        match &entry.order_id {
            Some(order_id) => println!("  order {}: {}", order_id, entry.error),
            None => println!("  {}", entry.error),
        }
    }
    if result.fallback_lines > 0 {
        println!("  lines attached to fallback article: {}", result.fallback_lines);
    }

    Ok(if result.is_fetch_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn test_connection(db: &DatabaseConnection) -> anyhow::Result<ExitCode> {
    let config = scheduled_job::load_config(db).await?;
    if let Err(errors) = config.validate() {
        for error in errors {
            eprintln!("{}", error);
        }
        return Ok(ExitCode::FAILURE);
    }

    let client = GambioApiClient::from_config(&config)?;
    if !client.test_connection().await {
        eprintln!("Connection to {} failed", config.base_url);
        return Ok(ExitCode::FAILURE);
    }
    println!("Connection to {} successful", config.base_url);

    let orders = client
        .list_orders(&OrderFilters::default().with_limit(1))
        .await?;
    match orders.first() {
        Some(order) => println!("Sample order: {}", order.display_id()),
        None => println!("No orders returned"),
    }
    Ok(ExitCode::SUCCESS)
}

async fn show_settings(db: &DatabaseConnection) -> anyhow::Result<ExitCode> {
    let config: GambioConfig = scheduled_job::load_config(db).await?;
    let store = SettingsStore::new(db);
    for key in settings_keys::ALL {
        let value = if key == settings_keys::PASSWORD {
            config.masked_password()
        } else {
            store.get(key).await?.unwrap_or_default()
        };
        println!("{} = {}", key, value);
    }
    Ok(ExitCode::SUCCESS)
}

async fn set_setting(db: &DatabaseConnection, name: &str, value: &str) -> anyhow::Result<ExitCode> {
    if !settings_keys::ALL.contains(&name) {
        eprintln!(
            "Unknown setting '{}'. Known settings: {}",
            name,
            settings_keys::ALL.join(", ")
        );
        return Ok(ExitCode::FAILURE);
    }
    SettingsStore::new(db).set(name, value).await?;
    tracing::info!("Setting {} updated", name);
    Ok(ExitCode::SUCCESS)
}
