#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
};
use axum_test::TestServer;
use jiff::{Timestamp, civil::Date, tz::TimeZone};
use mystery_movie::{
    AppState,
    calendar::Calendar,
    config::{Config, TmdbCredential},
    tmdb::TmdbClient,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use serde_json::{Value, json};

pub const API_KEY: &str = "test-key";

type Params = Query<HashMap<String, String>>;
type MockReply = (StatusCode, Json<Value>);

pub fn today() -> Date {
    Timestamp::now().to_zoned(TimeZone::UTC).date()
}

/// In-memory SQLite pinned to a single connection so every query sees the
/// same database.
pub async fn memory_db() -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    Ok(Database::connect(opts).await?)
}

pub async fn calendar_db(rows: &[(&str, Option<i64>, Option<&str>)]) -> Result<DatabaseConnection> {
    let db = memory_db().await?;
    db.execute_unprepared(
        "CREATE TABLE calendar (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            movie_id INTEGER,
            quote_en TEXT,
            quote_pl TEXT,
            description TEXT
        )",
    )
    .await?;

    for (date, movie_id, quote_en) in rows {
        let movie_id = movie_id.map(|id| id.to_string()).unwrap_or_else(|| "NULL".to_string());
        let quote_en = quote_en.map(|q| format!("'{q}'")).unwrap_or_else(|| "NULL".to_string());
        db.execute_unprepared(&format!(
            "INSERT INTO calendar (date, movie_id, quote_en, quote_pl, description)
             VALUES ('{date}', {movie_id}, {quote_en}, 'Cytat', 'A mystery')"
        ))
        .await?;
    }

    Ok(db)
}

pub async fn spawn_tmdb() -> Result<String> {
    let router = Router::new()
        .route("/movie/{id}", get(movie))
        .route("/movie/{id}/credits", get(credits))
        .route("/search/movie", get(search));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(format!("http://{addr}"))
}

pub fn calendar(db: DatabaseConnection) -> Calendar {
    calendar_in(db, TimeZone::UTC)
}

pub fn calendar_in(db: DatabaseConnection, timezone: TimeZone) -> Calendar {
    Calendar::new(db, "calendar".to_string(), 1000, timezone)
}

pub async fn test_server(db: DatabaseConnection) -> Result<TestServer> {
    let tmdb_base_url = spawn_tmdb().await?;
    test_server_with(db, tmdb_base_url, TmdbCredential::ApiKey(API_KEY.to_string())).await
}

pub async fn test_server_with(
    db: DatabaseConnection,
    tmdb_base_url: String,
    tmdb_credential: TmdbCredential,
) -> Result<TestServer> {
    let config = Arc::new(Config {
        addr: "127.0.0.1:0".parse()?,
        database_url: "sqlite::memory:".to_string(),
        tmdb_credential,
        tmdb_base_url,
        tmdb_language: "en-US".to_string(),
        tmdb_timeout: Duration::from_millis(300),
        calendar_table: "calendar".to_string(),
        calendar_scan_limit: 1000,
        timezone: TimeZone::UTC,
    });

    let http = mystery_movie::http_client(&config)?;
    let tmdb = TmdbClient::new(
        http,
        config.tmdb_credential.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_language.clone(),
    );
    let state = Arc::new(AppState { calendar: calendar_in(db, config.timezone.clone()), config, tmdb });

    TestServer::new(mystery_movie::app(state)).map_err(|err| anyhow::anyhow!(err.to_string()))
}

fn check_params(params: &HashMap<String, String>) -> Option<MockReply> {
    if params.get("api_key").map(String::as_str) != Some(API_KEY) {
        return Some(error(StatusCode::UNAUTHORIZED, "Invalid API key: You must be granted a valid key."));
    }
    if params.get("language").map(String::as_str) != Some("en-US") {
        return Some(error(StatusCode::BAD_REQUEST, "language is required"));
    }
    None
}

fn error(status: StatusCode, message: &str) -> MockReply {
    (status, Json(json!({ "success": false, "status_code": 34, "status_message": message })))
}

fn not_found() -> MockReply {
    error(StatusCode::NOT_FOUND, "The resource you requested could not be found.")
}

async fn movie(Path(id): Path<i64>, Query(params): Params) -> MockReply {
    if let Some(reply) = check_params(&params) {
        return reply;
    }
    match id {
        550 => (
            StatusCode::OK,
            Json(json!({ "id": 550, "title": "Fight Club", "release_date": "1999-10-15", "runtime": 139 })),
        ),
        603 => (StatusCode::OK, Json(json!({ "id": 603, "title": "The Matrix" }))),
        999 => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, Json(json!({ "id": 999 })))
        },
        _ => not_found(),
    }
}

async fn credits(Path(id): Path<i64>, Query(params): Params) -> MockReply {
    if let Some(reply) = check_params(&params) {
        return reply;
    }
    match id {
        550 => (
            StatusCode::OK,
            Json(json!({
                "id": 550,
                "cast": [
                    { "name": "Edward Norton", "character": "The Narrator", "order": 0 },
                    { "name": "Brad Pitt", "character": "Tyler Durden", "order": 1 }
                ],
                "crew": [{ "name": "David Fincher", "job": "Director" }]
            })),
        ),
        603 => (StatusCode::OK, Json(json!({ "id": 603 }))),
        999 => (StatusCode::OK, Json(json!({ "id": 999, "cast": [], "crew": [] }))),
        _ => not_found(),
    }
}

async fn search(Query(params): Params) -> MockReply {
    if let Some(reply) = check_params(&params) {
        return reply;
    }
    let query = params.get("query").cloned().unwrap_or_default();
    let results = if query.to_lowercase().contains("fight") {
        vec![json!({ "id": 550, "title": "Fight Club" })]
    } else if query.contains("echo") {
        vec![json!({ "id": 0, "title": query })]
    } else {
        vec![]
    };
    (
        StatusCode::OK,
        Json(json!({
            "page": 1,
            "results": results,
            "total_results": 1337,
            "total_pages": 67
        })),
    )
}
