use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    AppState,
    calendar::{CalendarEntry, CalendarLookup},
    error::{AppError, AppResult},
    extract::{ApiPath, ApiQuery},
    models::{
        MovieResponse, MysteryMovie, MysteryMovieWithQuotes, SearchQuery, SearchResponse,
        StatusMessage,
    },
};

pub async fn index() -> Json<StatusMessage> {
    Json(StatusMessage { message: "Mystery movie API is running" })
}

pub async fn mystery_movie(State(state): State<Arc<AppState>>) -> AppResult<Json<MysteryMovie>> {
    let entry = todays_entry(&state).await?;
    let movie = state.tmdb.movie_details(entry.movie_id).await?;

    Ok(Json(MysteryMovie { date: entry.date.to_string(), movie }))
}

pub async fn api_mystery_movie(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<MysteryMovieWithQuotes>> {
    let entry = todays_entry(&state).await?;
    let movie = state.tmdb.movie_details_with_credits(entry.movie_id).await?;

    Ok(Json(MysteryMovieWithQuotes {
        date: entry.date.to_string(),
        quote_en: entry.quote_en,
        quote_pl: entry.quote_pl,
        description: entry.description,
        movie,
    }))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let query = q.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(AppError::Validation("query parameter is required".to_string()));
    }

    tracing::info!(query = %query, "searching movies");
    let page = state.tmdb.search_movies(&query).await?;

    Ok(Json(SearchResponse {
        query,
        results: page.results,
        total_results: page.total_results,
        page: page.page,
        total_pages: page.total_pages,
    }))
}

pub async fn movie(
    State(state): State<Arc<AppState>>,
    ApiPath(movie_id): ApiPath<String>,
) -> AppResult<Json<MovieResponse>> {
    let movie_id = movie_id.trim();
    if movie_id.is_empty() {
        return Err(AppError::Validation("movie id is required".to_string()));
    }
    let movie_id: i64 = movie_id
        .parse()
        .map_err(|_| AppError::Validation(format!("movie id must be numeric, got {movie_id:?}")))?;

    let movie = state.tmdb.movie_details_with_credits(movie_id).await?;
    Ok(Json(MovieResponse { movie }))
}

pub async fn missing_movie_id() -> AppError {
    AppError::Validation("movie id is required".to_string())
}

async fn todays_entry(state: &AppState) -> AppResult<CalendarEntry> {
    let today = state.calendar.today();

    match state.calendar.find_entry(today).await? {
        CalendarLookup::Found(entry) => {
            tracing::info!(date = %entry.date, movie_id = entry.movie_id, "mystery movie resolved");
            Ok(entry)
        },
        CalendarLookup::Missing(diagnostics) => Err(AppError::NotFound {
            message: format!("no mystery movie scheduled for {today}"),
            diagnostics: Some(diagnostics),
        }),
    }
}
