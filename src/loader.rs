use std::{collections::HashSet, path::Path};

use anyhow::Context;
use tracing::info;

use crate::{
    error::AppResult,
    models::{Datasets, MovieRow, RatingRow},
};

/// Reads both CSV inputs. Only the first `movie_limit` movies are kept (all of
/// them when `None`), and ratings are restricted to those movies.
pub fn load_datasets(
    movies_path: &Path,
    ratings_path: &Path,
    movie_limit: Option<usize>,
) -> AppResult<Datasets> {
    info!(movies = %movies_path.display(), ratings = %ratings_path.display(), "loading CSVs");

    let movies = read_movies(movies_path, movie_limit)?;
    let movie_ids: HashSet<i64> = movies.iter().map(|m| m.movie_id).collect();

    let ratings = read_ratings(ratings_path, &movie_ids)?;

    info!(movies = movies.len(), ratings = ratings.len(), "datasets loaded");
    Ok(Datasets { movies, ratings })
}

fn read_movies(path: &Path, limit: Option<usize>) -> AppResult<Vec<MovieRow>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening movies file {}", path.display()))?;

    let rows = rdr
        .deserialize::<MovieRow>()
        .take(limit.unwrap_or(usize::MAX))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading movies file {}", path.display()))?;
    Ok(rows)
}

/// Streams the ratings file, keeping only rows for `movie_ids`.
fn read_ratings(path: &Path, movie_ids: &HashSet<i64>) -> AppResult<Vec<RatingRow>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening ratings file {}", path.display()))?;

    let rows = rdr
        .deserialize::<RatingRow>()
        .filter(|row| row.as_ref().map_or(true, |r| movie_ids.contains(&r.movie_id)))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading ratings file {}", path.display()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn truncates_movies_and_filters_ratings() {
        let dir = tempfile::tempdir().unwrap();
        let (movies, ratings) = test_support::write_fixture_csvs(dir.path());

        let data = load_datasets(&movies, &ratings, Some(2)).unwrap();

        assert_eq!(data.movies.iter().map(|m| m.movie_id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(data.ratings.iter().all(|r| r.movie_id == 1 || r.movie_id == 2));
        assert_eq!(data.ratings.len(), 3);
    }

    #[test]
    fn unbounded_limit_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (movies, ratings) = test_support::write_fixture_csvs(dir.path());

        let data = load_datasets(&movies, &ratings, None).unwrap();

        assert_eq!(data.movies.len(), 3);
        assert_eq!(data.ratings.len(), 4);
        assert!(data.ratings.iter().all(|r| r.movie_id != 99));
        assert_eq!(data.movies[2].genres, None);
        assert_eq!(data.movies[0].title, "Toy Story (1995)");
    }

    #[test]
    fn malformed_row_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let (movies, _) = test_support::write_fixture_csvs(dir.path());
        let ratings = dir.path().join("broken_ratings.csv");
        std::fs::write(&ratings, "userId,movieId,rating,timestamp\n1,1,four,964982703\n")
            .unwrap();

        let err = load_datasets(&movies, &ratings, None).unwrap_err();
        assert!(err.to_string().contains("broken_ratings.csv"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (movies, _) = test_support::write_fixture_csvs(dir.path());

        let err = load_datasets(&movies, &dir.path().join("missing.csv"), None).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }
}
