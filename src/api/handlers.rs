use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{
        format_title_for_display, DatasetStats, Movie, PopularMovie, RatedMovie, SimilarMovie,
    },
};

use super::AppState;

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_POPULAR_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub title: String,
    pub n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct GenreQuery {
    /// Comma-separated genre names
    pub genres: String,
    pub n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub movie_id: u32,
    pub title: String,
    pub display_title: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
}

impl From<&Movie> for MovieResponse {
    fn from(movie: &Movie) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            display_title: format_title_for_display(&movie.title),
            year: movie.year,
            genres: movie.genres.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimilarMovieResponse {
    #[serde(flatten)]
    pub movie: MovieResponse,
    pub score: f32,
}

impl From<&SimilarMovie> for SimilarMovieResponse {
    fn from(similar: &SimilarMovie) -> Self {
        Self {
            movie: MovieResponse::from(&similar.movie),
            score: similar.score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub query: String,
    pub results: Vec<SimilarMovieResponse>,
}

#[derive(Debug, Serialize)]
pub struct RatedMovieResponse {
    #[serde(flatten)]
    pub movie: MovieResponse,
    pub avg_rating: Option<f64>,
}

impl From<&RatedMovie> for RatedMovieResponse {
    fn from(rated: &RatedMovie) -> Self {
        Self {
            movie: MovieResponse::from(&rated.movie),
            avg_rating: rated.avg_rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PopularMovieResponse {
    #[serde(flatten)]
    pub movie: MovieResponse,
    pub avg_rating: f64,
    pub rating_count: usize,
}

impl From<&PopularMovie> for PopularMovieResponse {
    fn from(popular: &PopularMovie) -> Self {
        Self {
            movie: MovieResponse::from(&popular.movie),
            avg_rating: popular.avg_rating,
            rating_count: popular.rating_count,
        }
    }
}

fn validate_limit(n: Option<usize>, default: usize) -> AppResult<usize> {
    let n = n.unwrap_or(default);
    if n == 0 || n > MAX_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "n must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    Ok(n)
}

fn parse_genres(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Dataset summary
pub async fn get_stats(State(state): State<AppState>) -> Json<DatasetStats> {
    Json(state.recommender.stats())
}

/// Distinct genres, for populating selection controls
pub async fn get_genres(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.recommender.genres())
}

/// Movies similar to the first title matching the query
pub async fn similar_movies(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SimilarQuery>,
) -> AppResult<Json<SimilarResponse>> {
    let title = params.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("title must not be empty".to_string()));
    }
    let n = validate_limit(params.n, DEFAULT_LIMIT)?;

    let Some(results) = state.recommender.find_similar_movies(title, n) else {
        tracing::info!(request_id = %request_id, title = %title, "No movie matches title");
        return Err(AppError::NotFound(format!(
            "Movie '{}' not found. Please try another title.",
            title
        )));
    };

    tracing::info!(
        request_id = %request_id,
        title = %title,
        result_count = results.len(),
        "Similar movies found"
    );

    Ok(Json(SimilarResponse {
        query: title.to_string(),
        results: results.iter().map(SimilarMovieResponse::from).collect(),
    }))
}

/// Top-rated movies within any of the requested genres
pub async fn movies_by_genre(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<GenreQuery>,
) -> AppResult<Json<Vec<RatedMovieResponse>>> {
    let genres = parse_genres(&params.genres);
    if genres.is_empty() {
        return Err(AppError::InvalidInput(
            "at least one genre is required".to_string(),
        ));
    }
    let n = validate_limit(params.n, DEFAULT_LIMIT)?;

    let results = state.recommender.recommend_by_genres(&genres, n);

    tracing::info!(
        request_id = %request_id,
        genres = ?genres,
        result_count = results.len(),
        "Genre recommendations computed"
    );

    Ok(Json(results.iter().map(RatedMovieResponse::from).collect()))
}

/// Highest-rated movies among those with enough ratings
pub async fn popular_movies(
    State(state): State<AppState>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<Vec<PopularMovieResponse>>> {
    let n = validate_limit(params.n, DEFAULT_POPULAR_LIMIT)?;
    let results = state.recommender.popular_movies(n);
    Ok(Json(results.iter().map(PopularMovieResponse::from).collect()))
}
