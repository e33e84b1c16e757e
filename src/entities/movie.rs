use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub movie_id: i64,
    pub title: String,
    pub release_year: Option<i32>,
    pub imdb_id: Option<String>,
    pub director: Option<String>,
    pub plot: Option<String>,
    pub box_office: Option<String>,
    pub runtime: Option<String>,
    pub imdb_rating: Option<f64>,
    pub last_updated: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
