use std::sync::Arc;

use anyhow::Context;
use mystery_movie::{AppState, calendar::Calendar, config::Config, tmdb::TmdbClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,mystery_movie=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = mystery_movie::http_client(&config)?;

    let db = sea_orm::Database::connect(config.database_url.as_str())
        .await
        .context("connecting to DATABASE_URL")?;
    let calendar = Calendar::new(
        db,
        config.calendar_table.clone(),
        config.calendar_scan_limit,
        config.timezone.clone(),
    );

    let tmdb = TmdbClient::new(
        http,
        config.tmdb_credential.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_language.clone(),
    );

    let state = Arc::new(AppState { config: config.clone(), calendar, tmdb });
    let app = mystery_movie::app(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, table = %config.calendar_table, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
