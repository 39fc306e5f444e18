use std::time::Duration;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::TmdbCredential,
    error::{AppError, AppResult},
    models::SearchPage,
};

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

pub struct TmdbClient {
    client: reqwest::Client,
    credential: TmdbCredential,
    base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(
        client: reqwest::Client,
        credential: TmdbCredential,
        base_url: String,
        language: String,
    ) -> Self {
        Self { client, credential, base_url, language }
    }

    /// Movie details with `cast` and `crew` merged in from the credits
    /// endpoint. Both calls run concurrently and both must succeed.
    pub async fn movie_details_with_credits(&self, movie_id: i64) -> AppResult<Value> {
        let (mut details, credits) =
            futures::try_join!(self.movie_details(movie_id), self.movie_credits(movie_id))?;

        let Some(fields) = details.as_object_mut() else {
            return Err(anyhow::anyhow!("TMDB movie {movie_id} is not a JSON object").into());
        };
        fields.insert("cast".to_string(), Value::Array(credits.cast));
        fields.insert("crew".to_string(), Value::Array(credits.crew));

        Ok(details)
    }

    pub async fn movie_details(&self, movie_id: i64) -> AppResult<Value> {
        self.get_json(&format!("/movie/{movie_id}"), &[]).await
    }

    async fn movie_credits(&self, movie_id: i64) -> AppResult<Credits> {
        self.get_json(&format!("/movie/{movie_id}/credits"), &[]).await
    }

    pub async fn search_movies(&self, query: &str) -> AppResult<SearchPage> {
        self.get_json("/search/movie", &[("query", query)]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        debug!(path = %path, "TMDB request");

        let resp = self.send_with_retry(&url, params).await?;
        let status = resp.status();

        if !status.is_success() {
            let message = resp
                .json::<StatusBody>()
                .await
                .ok()
                .and_then(|b| b.status_message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            warn!(path = %path, status = status.as_u16(), message = %message, "TMDB error response");
            return Err(AppError::Upstream { status: status.as_u16(), message });
        }

        resp.json().await.map_err(transport_error)
    }

    /// Sends the request, retrying once after a short pause when the first
    /// attempt times out or cannot connect.
    async fn send_with_retry(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> AppResult<reqwest::Response> {
        match self.request(url, params).send().await {
            Ok(resp) => Ok(resp),
            Err(err) if err.is_timeout() || err.is_connect() => {
                let err = err.without_url();
                warn!(url = %url, error = %err, "TMDB request failed, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.request(url, params).send().await.map_err(transport_error)
            },
            Err(err) => Err(transport_error(err)),
        }
    }

    fn request(&self, url: &str, params: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let req = self
            .client
            .get(url)
            .query(&[("language", self.language.as_str())])
            .query(params);

        match &self.credential {
            TmdbCredential::AccessToken(token) => req.bearer_auth(token),
            TmdbCredential::ApiKey(key) => req.query(&[("api_key", key.as_str())]),
        }
    }
}

/// The request URL can carry the API key, so it never reaches the error.
fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() { AppError::UpstreamTimeout } else { AppError::Network(err.without_url()) }
}

#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<Value>,
    #[serde(default)]
    crew: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status_message: Option<String>,
}
