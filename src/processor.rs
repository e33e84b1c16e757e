use std::{collections::BTreeSet, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    error::AppResult,
    genres,
    models::{GenreReport, MovieRecord, MovieReport, MovieRow, RatingReport, RatingRow},
    omdb::OmdbClient,
    store::CatalogStore,
    title::parse_title_and_year,
};

/// Writes every movie that is not stored yet, enriching it through OMDb first
/// when `enrich` is set.
///
/// Movies whose id already exists are skipped outright, so a re-run never
/// re-fetches or rewrites them. Chunks are written independently; a failed
/// chunk is logged and the remaining chunks are still attempted.
pub async fn upsert_movies(
    store: &CatalogStore,
    omdb: &OmdbClient,
    movies: &[MovieRow],
    enrich: bool,
    throttle: Duration,
    chunk_size: usize,
) -> AppResult<MovieReport> {
    info!(movies = movies.len(), enrich, "preparing movies for upsert");

    let existing = store.existing_movie_ids().await?;
    let enrich = enrich && omdb.is_enabled();

    let mut report = MovieReport { seen: movies.len(), ..Default::default() };
    let mut records = Vec::new();

    for row in movies {
        if existing.contains(&row.movie_id) {
            report.skipped_existing += 1;
            continue;
        }

        let (title, year) = parse_title_and_year(&row.title);
        let mut record = MovieRecord::new(row.movie_id, row.title.clone(), year);

        if enrich {
            debug!(movie_id = row.movie_id, title = %title, year = ?year, "fetching from OMDb");
            let meta = omdb.fetch(title, year).await;
            tokio::time::sleep(throttle).await;
            if let Some(meta) = meta {
                record.apply_metadata(meta);
                report.enriched += 1;
            }
        }

        records.push(record);
    }

    info!(new = records.len(), skipped = report.skipped_existing, "new movies to insert");

    for (index, chunk) in records.chunks(chunk_size.max(1)).enumerate() {
        match store.upsert_movies(chunk).await {
            Ok(_) => report.written += chunk.len(),
            Err(err) => {
                warn!(
                    chunk = index,
                    rows = chunk.len(),
                    error = %err,
                    "failed to upsert movie chunk"
                );
                report.failed_chunks += 1;
            },
        }
    }

    info!(written = report.written, failed_chunks = report.failed_chunks, "movies upsert complete");
    Ok(report)
}

/// Stores the genre vocabulary of `movies` and links each movie to its genres.
///
/// `movies` must be the whole loaded catalog, not just the rows that were new
/// in this run, so that every token is known before links are written. Links
/// are only written for movies present in the store; the rest are counted as
/// skipped.
pub async fn normalize_genres(
    store: &CatalogStore,
    movies: &[MovieRow],
    chunk_size: usize,
) -> AppResult<GenreReport> {
    info!("normalizing genres");

    let names = genres::vocabulary(movies);
    let mut report = GenreReport { vocabulary: names.len(), ..Default::default() };

    if !names.is_empty() {
        if let Err(err) = store.insert_genres(&names).await {
            warn!(genres = names.len(), error = %err, "failed to insert genres");
            report.failed_batches += 1;
        }
    }

    let genre_ids = store.genre_ids().await?;
    let stored = store.existing_movie_ids().await?;

    let (linkable, missing): (Vec<&MovieRow>, Vec<&MovieRow>) =
        movies.iter().partition(|m| stored.contains(&m.movie_id));
    report.skipped_unknown_movie = missing.len();
    if !missing.is_empty() {
        warn!(movies = missing.len(), "skipping genre links for movies that are not stored");
    }

    let pairs: Vec<(i64, i32)> = linkable
        .into_iter()
        .filter_map(|m| m.genres.as_deref().map(|g| (m.movie_id, g)))
        .flat_map(|(movie_id, raw)| {
            genres::split_genres(raw)
                .filter_map(|name| genre_ids.get(name).map(|&id| (movie_id, id)))
                .collect::<Vec<_>>()
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    report.associations = pairs.len();

    for (index, chunk) in pairs.chunks(chunk_size.max(1)).enumerate() {
        if let Err(err) = store.insert_movie_genres(chunk).await {
            warn!(chunk = index, rows = chunk.len(), error = %err, "failed to insert movie genres");
            report.failed_batches += 1;
        }
    }

    info!(
        genres = report.vocabulary,
        associations = report.associations,
        "loaded genres and movie genre mappings"
    );
    Ok(report)
}

/// Inserts ratings whose movie is present in the store, ignoring duplicates.
pub async fn load_ratings(
    store: &CatalogStore,
    ratings: &[RatingRow],
    chunk_size: usize,
) -> AppResult<RatingReport> {
    info!(ratings = ratings.len(), "loading ratings");

    let stored = store.existing_movie_ids().await?;
    let (ratings, missing): (Vec<RatingRow>, Vec<RatingRow>) =
        ratings.iter().copied().partition(|r| stored.contains(&r.movie_id));
    if !missing.is_empty() {
        warn!(ratings = missing.len(), "skipping ratings for movies that are not stored");
    }

    let mut report = RatingReport {
        attempted: ratings.len(),
        skipped_unknown_movie: missing.len(),
        ..Default::default()
    };

    for (index, chunk) in ratings.chunks(chunk_size.max(1)).enumerate() {
        match store.insert_ratings(chunk).await {
            Ok(inserted) => report.inserted += inserted,
            Err(err) => {
                warn!(
                    chunk = index,
                    rows = chunk.len(),
                    error = %err,
                    "failed to insert rating chunk"
                );
                report.failed_chunks += 1;
            },
        }
    }

    info!(inserted = report.inserted, failed_chunks = report.failed_chunks, "ratings loaded");
    Ok(report)
}
