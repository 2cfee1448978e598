//! Content-based movie recommendations over the MovieLens 1M dataset.
//!
//! Startup loads the normalized tables (from a snapshot when one exists),
//! builds the genre similarity model once, and serves similar-movie,
//! genre-ranked and popularity-ranked queries over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
