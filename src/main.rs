mod config;
mod db;
mod entities;
mod error;
mod genres;
mod loader;
mod models;
mod omdb;
mod pipeline;
mod processor;
mod store;
#[cfg(test)]
mod test_support;
mod title;

use tracing::{info, warn};

use crate::{config::Config, omdb::OmdbClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,moviedb_etl=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent("moviedb-etl/0.1")
        .timeout(config.omdb_timeout)
        .build()?;

    let db = db::connect(&config.database_url).await?;
    info!("connected to database");

    let omdb = OmdbClient::new(
        http,
        config.omdb_api_key.clone(),
        config.omdb_base_url.clone(),
        config.omdb_timeout,
    );

    let report = pipeline::run(&config, &db, &omdb).await?;
    if report.degraded() {
        warn!("ETL finished with partial failures, see warnings above");
    }

    Ok(())
}
