use sea_orm::DatabaseConnection;
use tracing::info;

use crate::{
    config::Config,
    db,
    error::AppResult,
    loader,
    models::PipelineReport,
    omdb::OmdbClient,
    processor,
    store::CatalogStore,
};

/// One full pass: schema, datasets, movies, genres, ratings.
///
/// Write failures inside each step are logged and counted in the report; only
/// a failure to read the inputs or the database aborts the run.
pub async fn run(
    config: &Config,
    db: &DatabaseConnection,
    omdb: &OmdbClient,
) -> AppResult<PipelineReport> {
    info!("starting ETL run");

    let schema = db::init_schema(db, &config.schema_path).await?;

    let data =
        loader::load_datasets(&config.movies_csv, &config.ratings_csv, config.movie_limit)?;

    let store = CatalogStore::new(db.clone());

    let movies = processor::upsert_movies(
        &store,
        omdb,
        &data.movies,
        config.enrichment_enabled(),
        config.omdb_throttle,
        config.movie_chunk_size,
    )
    .await?;

    let genres =
        processor::normalize_genres(&store, &data.movies, config.genre_chunk_size).await?;

    let ratings = processor::load_ratings(&store, &data.ratings, config.rating_chunk_size).await?;

    let report = PipelineReport {
        schema,
        movies_loaded: data.movies.len(),
        ratings_loaded: data.ratings.len(),
        movies,
        genres,
        ratings,
    };

    info!(
        movies_loaded = report.movies_loaded,
        movies_new = report.movies.seen - report.movies.skipped_existing,
        movies_enriched = report.movies.enriched,
        movies_written = report.movies.written,
        genres = report.genres.vocabulary,
        genre_links = report.genres.associations,
        genre_links_skipped = report.genres.skipped_unknown_movie,
        ratings_loaded = report.ratings_loaded,
        ratings_attempted = report.ratings.attempted,
        ratings_inserted = report.ratings.inserted,
        ratings_skipped = report.ratings.skipped_unknown_movie,
        degraded = report.degraded(),
        "ETL complete"
    );
    Ok(report)
}
