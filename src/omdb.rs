use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{error::AppResult, models::MovieMetadata};

const NOT_AVAILABLE: &str = "N/A";

pub struct OmdbClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl OmdbClient {
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        base_url: String,
        timeout: Duration,
    ) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!("no OMDB_API_KEY provided, movie enrichment is disabled");
        }
        Self { client, api_key, base_url, timeout }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Looks up one title. Every failure is logged and reported as `None`.
    pub async fn fetch(&self, title: &str, year: Option<i32>) -> Option<MovieMetadata> {
        let api_key = self.api_key.as_deref()?;

        match self.request(api_key, title, year).await {
            Ok(resp) if resp.response == "True" => Some(resp.into_metadata()),
            Ok(resp) => {
                warn!(
                    title = %title,
                    year = ?year,
                    reason = resp.error.as_deref().unwrap_or("unknown"),
                    "OMDb returned no match"
                );
                None
            },
            Err(err) => {
                warn!(title = %title, year = ?year, error = %err, "OMDb request failed");
                None
            },
        }
    }

    async fn request(
        &self,
        api_key: &str,
        title: &str,
        year: Option<i32>,
    ) -> AppResult<OmdbResponse> {
        let mut req = self
            .client
            .get(&self.base_url)
            .timeout(self.timeout)
            .query(&[("apikey", api_key), ("t", title)]);
        if let Some(year) = year {
            req = req.query(&[("y", year)]);
        }

        let resp: OmdbResponse = req.send().await?.error_for_status()?.json().await?;
        Ok(resp)
    }
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "BoxOffice")]
    box_office: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
}

impl OmdbResponse {
    fn into_metadata(self) -> MovieMetadata {
        MovieMetadata {
            imdb_id: available(self.imdb_id),
            director: available(self.director),
            plot: available(self.plot),
            box_office: available(self.box_office),
            runtime: available(self.runtime),
            imdb_rating: available(self.imdb_rating).and_then(|r| r.parse().ok()),
            year: available(self.year)
                .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|y| y.parse().ok()),
        }
    }
}

fn available(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let s = s.trim();
        (!s.is_empty() && s != NOT_AVAILABLE).then(|| s.to_string())
    })
}
