use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use axum::{Json, Router, routing::get};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tempfile::TempDir;

use crate::{db, omdb::OmdbClient};

pub fn schema_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("schema.sql")
}

pub fn database_url(dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", dir.join("moviedb.db").display())
}

/// A fresh file-backed database with no tables. The directory must outlive
/// the connection.
pub async fn empty_db() -> (TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().unwrap();
    let db = db::connect(&database_url(dir.path())).await.unwrap();
    (dir, db)
}

pub async fn schema_db() -> (TempDir, DatabaseConnection) {
    let (dir, db) = empty_db().await;
    let report = db::init_schema(&db, &schema_path()).await.unwrap();
    assert_eq!(report.failed, 0);
    (dir, db)
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

/// An OMDb stand-in that answers far slower than the client timeout.
pub fn slow_omdb() -> Router {
    Router::new().route(
        "/",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "Response": "True", "imdbID": "tt-too-late" }))
        }),
    )
}

pub fn omdb_client(base_url: String, api_key: Option<&str>) -> OmdbClient {
    OmdbClient::new(
        reqwest::Client::new(),
        api_key.map(str::to_string),
        base_url,
        Duration::from_millis(300),
    )
}

/// Writes a small MovieLens-shaped pair of CSV files into `dir`.
pub fn write_fixture_csvs(dir: &Path) -> (PathBuf, PathBuf) {
    let movies = dir.join("movies.csv");
    let ratings = dir.join("ratings.csv");

    std::fs::write(
        &movies,
        "movieId,title,genres\n\
         1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy\n\
         2,Grumpier Old Men (1995),Comedy|Romance|(no genres listed)\n\
         3,Untitled Reel,\n",
    )
    .unwrap();

    std::fs::write(
        &ratings,
        "userId,movieId,rating,timestamp\n\
         1,1,4.0,964982703\n\
         1,2,4.0,964981247\n\
         2,1,3.5,1445714835\n\
         2,3,5.0,1445714836\n\
         3,99,1.0,1445714837\n",
    )
    .unwrap();

    (movies, ratings)
}
