use std::sync::Arc;

use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::DateTime;
use serde_json::Value;

use movielens_recommender::api::{create_router, AppState};
use movielens_recommender::middleware::request_id::REQUEST_ID_HEADER;
use movielens_recommender::models::{Dataset, Movie, Rating};
use movielens_recommender::services::MovieRecommender;

fn movie(id: u32, title: &str, genres: &[&str]) -> Movie {
    Movie::new(
        id,
        title.to_string(),
        Some(1995),
        genres.iter().map(|g| g.to_string()).collect(),
    )
}

fn rating(user_id: u32, movie_id: u32, value: f32) -> Rating {
    Rating {
        user_id,
        movie_id,
        rating: value,
        timestamp: DateTime::from_timestamp(978300760, 0).unwrap(),
    }
}

fn create_test_server() -> TestServer {
    let movies = vec![
        movie(1, "Toy Story", &["Animation", "Children's", "Comedy"]),
        movie(2, "Jumanji", &["Adventure", "Children's", "Fantasy"]),
        movie(3, "American President, The", &["Comedy", "Drama", "Romance"]),
        movie(4, "Heat", &["Action", "Crime", "Thriller"]),
    ];

    // Toy Story: 120 ratings alternating 5/4; Jumanji: 99 ratings of 5
    let mut ratings = Vec::new();
    for user in 1..=120 {
        ratings.push(rating(user, 1, if user % 2 == 0 { 5.0 } else { 4.0 }));
    }
    for user in 1..=99 {
        ratings.push(rating(user, 2, 5.0));
    }
    ratings.push(rating(1, 3, 3.0));

    let dataset = Dataset {
        movies,
        ratings,
        ..Default::default()
    };
    let recommender = MovieRecommender::from_dataset(dataset).unwrap();
    let state = AppState::new(Arc::new(recommender));
    TestServer::new(create_router(state)).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let server = create_test_server();
    let response = server.get("/health").await;
    assert!(response.headers().get(REQUEST_ID_HEADER).is_some());
}

#[tokio::test]
async fn test_genres_listing() {
    let server = create_test_server();
    let response = server.get("/api/v1/genres").await;
    response.assert_status_ok();
    let genres: Vec<String> = response.json();
    assert_eq!(genres.first().map(String::as_str), Some("Action"));
    assert!(genres.contains(&"Children's".to_string()));
}

#[tokio::test]
async fn test_similar_movies_excludes_query() {
    let server = create_test_server();
    let response = server.get("/api/v1/movies/similar?title=toy&n=3").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r["movie_id"] != 1));
}

#[tokio::test]
async fn test_similar_movies_unknown_title() {
    let server = create_test_server();
    let response = server.get("/api/v1/movies/similar?title=Casablanca").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_similar_movies_single_movie_catalog() {
    let dataset = Dataset {
        movies: vec![movie(1, "Toy Story", &["Animation", "Comedy"])],
        ..Default::default()
    };
    let recommender = MovieRecommender::from_dataset(dataset).unwrap();
    let server = TestServer::new(create_router(AppState::new(Arc::new(recommender)))).unwrap();

    let response = server.get("/api/v1/movies/similar?title=toy").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = create_test_server();
    let response = server
        .get("/health")
        .add_header(ORIGIN, HeaderValue::from_static("http://localhost:8501"))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("*"))
    );
    assert!(response.headers().get(REQUEST_ID_HEADER).is_some());
}

#[tokio::test]
async fn test_movies_by_genre_comedy() {
    let server = create_test_server();
    let response = server.get("/api/v1/movies/by-genre?genres=comedy").await;
    response.assert_status_ok();

    let results: Vec<Value> = response.json();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["title"], "Toy Story");
    assert_eq!(results[0]["avg_rating"], 4.5);
    assert_eq!(results[1]["display_title"], "The American President");
}

#[tokio::test]
async fn test_movies_by_genre_requires_genres() {
    let server = create_test_server();
    let response = server.get("/api/v1/movies/by-genre?genres=").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_popular_movies_threshold() {
    let server = create_test_server();
    let response = server.get("/api/v1/movies/popular?n=10").await;
    response.assert_status_ok();

    let results: Vec<Value> = response.json();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["movie_id"], 1);
    assert_eq!(results[0]["rating_count"], 120);
}

#[tokio::test]
async fn test_stats() {
    let server = create_test_server();
    let response = server.get("/api/v1/stats").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["movie_count"], 4);
    assert_eq!(body["rating_count"], 220);
}
