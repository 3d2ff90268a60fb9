use std::{env, path::PathBuf};

use anyhow::Context;
use db::DBService;
use server::{AppState, app};
use services::services::config::KernelConfig;
use tracing::info;
use utils::logging::init_tracing;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config_path = env::var("KERNEL_CONFIG").ok().map(PathBuf::from);
    let config = KernelConfig::from_env(config_path.as_deref())
        .context("failed to load kernel configuration")?;

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = DBService::connect(&database_url)
        .await
        .with_context(|| format!("failed to open {database_url}"))?;

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = match env::var("PORT") {
        Ok(raw) => raw.parse().with_context(|| format!("invalid PORT {raw:?}"))?,
        Err(_) => DEFAULT_PORT,
    };

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!(
        address = %listener.local_addr()?,
        tax_rate_bp = config.tax_rate_bp,
        delete_policy = %config.delete_policy,
        "Server listening"
    );
    axum::serve(listener, app(AppState::new(db, config))).await?;
    Ok(())
}
