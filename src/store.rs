use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveValue::NotSet, DatabaseConnection, EntityTrait, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

use crate::{
    entities::{genre, movie, movie_genre, rating},
    error::AppResult,
    models::{MovieRecord, RatingRow},
};

/// Write access to the four catalog tables. Every write runs in its own
/// short transaction.
#[derive(Clone)]
pub struct CatalogStore {
    db: DatabaseConnection,
}

impl CatalogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn existing_movie_ids(&self) -> AppResult<HashSet<i64>> {
        let ids = movie::Entity::find()
            .select_only()
            .column(movie::Column::MovieId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Upserts a batch of movies. On conflict, title and release year are
    /// overwritten while stored enrichment values survive incoming nulls.
    pub async fn upsert_movies(&self, records: &[MovieRecord]) -> AppResult<u64> {
        let models = records.iter().map(|r| movie::ActiveModel {
            movie_id: Set(r.movie_id),
            title: Set(r.title.clone()),
            release_year: Set(r.release_year),
            imdb_id: Set(r.imdb_id.clone()),
            director: Set(r.director.clone()),
            plot: Set(r.plot.clone()),
            box_office: Set(r.box_office.clone()),
            runtime: Set(r.runtime.clone()),
            imdb_rating: Set(r.imdb_rating),
            last_updated: NotSet,
        });

        let txn = self.db.begin().await?;
        let affected = movie::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(movie::Column::MovieId)
                    .update_columns([movie::Column::Title, movie::Column::ReleaseYear])
                    .value(
                        movie::Column::ImdbId,
                        Expr::cust("COALESCE(excluded.imdb_id, movies.imdb_id)"),
                    )
                    .value(
                        movie::Column::Director,
                        Expr::cust("COALESCE(excluded.director, movies.director)"),
                    )
                    .value(movie::Column::Plot, Expr::cust("COALESCE(excluded.plot, movies.plot)"))
                    .value(
                        movie::Column::BoxOffice,
                        Expr::cust("COALESCE(excluded.box_office, movies.box_office)"),
                    )
                    .value(
                        movie::Column::Runtime,
                        Expr::cust("COALESCE(excluded.runtime, movies.runtime)"),
                    )
                    .value(
                        movie::Column::ImdbRating,
                        Expr::cust("COALESCE(excluded.imdb_rating, movies.imdb_rating)"),
                    )
                    .value(movie::Column::LastUpdated, Expr::cust("CURRENT_TIMESTAMP"))
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        txn.commit().await?;

        Ok(affected)
    }

    /// Inserts genre names that are not stored yet.
    pub async fn insert_genres(&self, names: &[String]) -> AppResult<u64> {
        let models = names
            .iter()
            .map(|name| genre::ActiveModel { genre_id: NotSet, name: Set(name.clone()) });

        let txn = self.db.begin().await?;
        let inserted = genre::Entity::insert_many(models)
            .on_conflict(OnConflict::column(genre::Column::Name).do_nothing().to_owned())
            .exec_without_returning(&txn)
            .await?;
        txn.commit().await?;

        Ok(inserted)
    }

    pub async fn genre_ids(&self) -> AppResult<HashMap<String, i32>> {
        let genres = genre::Entity::find().all(&self.db).await?;
        Ok(genres.into_iter().map(|g| (g.name, g.genre_id)).collect())
    }

    pub async fn insert_movie_genres(&self, pairs: &[(i64, i32)]) -> AppResult<u64> {
        let models = pairs.iter().map(|&(movie_id, genre_id)| movie_genre::ActiveModel {
            movie_id: Set(movie_id),
            genre_id: Set(genre_id),
        });

        let txn = self.db.begin().await?;
        let inserted = movie_genre::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([movie_genre::Column::MovieId, movie_genre::Column::GenreId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        txn.commit().await?;

        Ok(inserted)
    }

    pub async fn insert_ratings(&self, rows: &[RatingRow]) -> AppResult<u64> {
        let models = rows.iter().map(|r| rating::ActiveModel {
            user_id: Set(r.user_id),
            movie_id: Set(r.movie_id),
            rating: Set(r.rating),
            ts: Set(r.timestamp),
        });

        let txn = self.db.begin().await?;
        let inserted = rating::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    rating::Column::UserId,
                    rating::Column::MovieId,
                    rating::Column::Ts,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        txn.commit().await?;

        Ok(inserted)
    }
}
