use std::{path::PathBuf, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub omdb_api_key: Option<String>,
    pub omdb_base_url: String,
    pub omdb_timeout: Duration,
    pub omdb_throttle: Duration,
    pub movies_csv: PathBuf,
    pub ratings_csv: PathBuf,
    pub schema_path: PathBuf,
    /// `None` loads every movie row.
    pub movie_limit: Option<usize>,
    pub movie_chunk_size: usize,
    pub genre_chunk_size: usize,
    pub rating_chunk_size: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://moviedb.db?mode=rwc".to_string());

        let omdb_api_key = std::env::var("OMDB_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let omdb_base_url = std::env::var("OMDB_BASE_URL")
            .unwrap_or_else(|_| "http://www.omdbapi.com/".to_string());

        let omdb_timeout_secs: u64 = numeric_var("OMDB_TIMEOUT_SECS", 8)?;
        let omdb_throttle_ms: u64 = numeric_var("OMDB_THROTTLE_MS", 200)?;

        let movies_csv = std::env::var("MOVIES_CSV").unwrap_or_else(|_| "movies.csv".to_string());
        let ratings_csv =
            std::env::var("RATINGS_CSV").unwrap_or_else(|_| "ratings.csv".to_string());
        let schema_path = std::env::var("SCHEMA_PATH").unwrap_or_else(|_| "schema.sql".to_string());

        let movie_limit = match std::env::var("MOVIE_LIMIT") {
            Ok(raw) => parse_movie_limit(&raw).context("MOVIE_LIMIT")?,
            Err(_) => Some(100),
        };

        let movie_chunk_size: usize = numeric_var("MOVIE_CHUNK_SIZE", 500)?;
        let genre_chunk_size: usize = numeric_var("GENRE_CHUNK_SIZE", 1000)?;
        let rating_chunk_size: usize = numeric_var("RATING_CHUNK_SIZE", 1000)?;

        Ok(Self {
            database_url,
            omdb_api_key,
            omdb_base_url,
            omdb_timeout: Duration::from_secs(omdb_timeout_secs),
            omdb_throttle: Duration::from_millis(omdb_throttle_ms),
            movies_csv: movies_csv.into(),
            ratings_csv: ratings_csv.into(),
            schema_path: schema_path.into(),
            movie_limit,
            movie_chunk_size: movie_chunk_size.max(1),
            genre_chunk_size: genre_chunk_size.max(1),
            rating_chunk_size: rating_chunk_size.max(1),
        })
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.omdb_api_key.is_some()
    }
}

fn numeric_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => parse_numeric(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_numeric<T>(name: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse().with_context(|| format!("invalid value {raw:?} for {name}"))
}

fn parse_movie_limit(raw: &str) -> anyhow::Result<Option<usize>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    let limit: usize = raw.parse()?;
    Ok((limit > 0).then_some(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_limit_accepts_all_and_zero_as_unbounded() {
        assert_eq!(parse_movie_limit("all").unwrap(), None);
        assert_eq!(parse_movie_limit("ALL").unwrap(), None);
        assert_eq!(parse_movie_limit("0").unwrap(), None);
        assert_eq!(parse_movie_limit(" 250 ").unwrap(), Some(250));
    }

    #[test]
    fn numeric_settings_reject_garbage_naming_the_variable() {
        assert_eq!(parse_numeric::<u64>("OMDB_THROTTLE_MS", " 250 ").unwrap(), 250);

        let err = parse_numeric::<usize>("RATING_CHUNK_SIZE", "1k").unwrap_err();
        assert!(err.to_string().contains("RATING_CHUNK_SIZE"));
        assert!(parse_numeric::<u64>("OMDB_THROTTLE_MS", "-5").is_err());
    }

    #[test]
    fn movie_limit_rejects_garbage() {
        assert!(parse_movie_limit("lots").is_err());
    }
}
