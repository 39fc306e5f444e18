use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of `/search/movie` results, passed through as TMDB returns it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchPage {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub total_results: Value,
    #[serde(default)]
    pub page: Value,
    #[serde(default)]
    pub total_pages: Value,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MysteryMovie {
    pub date: String,
    pub movie: Value,
}

#[derive(Debug, Serialize)]
pub struct MysteryMovieWithQuotes {
    pub date: String,
    pub quote_en: Option<String>,
    pub quote_pl: Option<String>,
    pub description: Option<String>,
    pub movie: Value,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<Value>,
    pub total_results: Value,
    pub page: Value,
    pub total_pages: Value,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub movie: Value,
}
