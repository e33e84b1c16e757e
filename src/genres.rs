use std::collections::BTreeSet;

use crate::models::MovieRow;

/// Placeholder MovieLens uses for movies without any genre.
pub const NO_GENRES: &str = "(no genres listed)";

/// Tokens of a pipe-delimited genre string, trimmed, without blanks or the
/// [`NO_GENRES`] placeholder.
pub fn split_genres(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('|').map(str::trim).filter(|g| !g.is_empty() && *g != NO_GENRES)
}

/// Sorted, deduplicated genre names across all movies.
pub fn vocabulary(movies: &[MovieRow]) -> Vec<String> {
    movies
        .iter()
        .filter_map(|m| m.genres.as_deref())
        .flat_map(split_genres)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
