use serde::Deserialize;

/// One row of the MovieLens `movies.csv` file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MovieRow {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    pub genres: Option<String>,
}

/// One row of the MovieLens `ratings.csv` file.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct RatingRow {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
    pub timestamp: i64,
}

#[derive(Clone, Debug, Default)]
pub struct Datasets {
    pub movies: Vec<MovieRow>,
    pub ratings: Vec<RatingRow>,
}

/// Enrichment fields, already normalized: `"N/A"` and blanks are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieMetadata {
    pub imdb_id: Option<String>,
    pub director: Option<String>,
    pub plot: Option<String>,
    pub box_office: Option<String>,
    pub runtime: Option<String>,
    pub imdb_rating: Option<f64>,
    pub year: Option<i32>,
}

/// A movie ready to be written to the `movies` table.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieRecord {
    pub movie_id: i64,
    pub title: String,
    pub release_year: Option<i32>,
    pub imdb_id: Option<String>,
    pub director: Option<String>,
    pub plot: Option<String>,
    pub box_office: Option<String>,
    pub runtime: Option<String>,
    pub imdb_rating: Option<f64>,
}

impl MovieRecord {
    pub fn new(movie_id: i64, title: impl Into<String>, release_year: Option<i32>) -> Self {
        Self {
            movie_id,
            title: title.into(),
            release_year,
            imdb_id: None,
            director: None,
            plot: None,
            box_office: None,
            runtime: None,
            imdb_rating: None,
        }
    }

    pub fn apply_metadata(&mut self, meta: MovieMetadata) {
        self.imdb_id = meta.imdb_id;
        self.director = meta.director;
        self.plot = meta.plot;
        self.box_office = meta.box_office;
        self.runtime = meta.runtime;
        self.imdb_rating = meta.imdb_rating;
        if let Some(year) = meta.year {
            self.release_year = Some(year);
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub executed: usize,
    pub failed: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovieReport {
    pub seen: usize,
    pub skipped_existing: usize,
    pub enriched: usize,
    pub written: usize,
    pub failed_chunks: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenreReport {
    pub vocabulary: usize,
    pub associations: usize,
    /// Movies whose links were not written because the movie is not stored.
    pub skipped_unknown_movie: usize,
    pub failed_batches: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RatingReport {
    pub attempted: usize,
    pub inserted: u64,
    pub skipped_unknown_movie: usize,
    pub failed_chunks: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub schema: SchemaReport,
    pub movies_loaded: usize,
    pub ratings_loaded: usize,
    pub movies: MovieReport,
    pub genres: GenreReport,
    pub ratings: RatingReport,
}

impl PipelineReport {
    /// True when any write step logged a failure during the run.
    pub fn degraded(&self) -> bool {
        self.schema.failed > 0
            || self.movies.failed_chunks > 0
            || self.genres.failed_batches > 0
            || self.ratings.failed_chunks > 0
    }
}
