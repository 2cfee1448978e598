use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod movie;
pub mod rating;
pub mod user;

pub use movie::Movie;
pub use rating::{FullRating, Rating};
pub use user::User;

/// The normalized MovieLens tables
///
/// Built once by the loader (or restored from a snapshot) and never mutated
/// afterwards. Row order of `movies` is significant: the similarity model is
/// indexed by it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub movies: Vec<Movie>,
    pub users: Vec<User>,
    pub ratings: Vec<Rating>,
    /// Inner join of ratings with their movie and user
    pub full: Vec<FullRating>,
}

impl Dataset {
    /// Distinct genre tags across the catalog, sorted
    pub fn genres(&self) -> Vec<String> {
        self.movies
            .iter()
            .flat_map(|m| m.genres.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Mean of every rating value, `None` when there are no ratings
    pub fn mean_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: f64 = self.ratings.iter().map(|r| r.rating as f64).sum();
        Some(sum / self.ratings.len() as f64)
    }
}

/// Summary counts over a dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetStats {
    pub movie_count: usize,
    pub user_count: usize,
    pub rating_count: usize,
    pub mean_rating: Option<f64>,
}

impl From<&Dataset> for DatasetStats {
    fn from(dataset: &Dataset) -> Self {
        Self {
            movie_count: dataset.movies.len(),
            user_count: dataset.users.len(),
            rating_count: dataset.ratings.len(),
            mean_rating: dataset.mean_rating(),
        }
    }
}

/// A movie paired with its similarity score to the query movie
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimilarMovie {
    pub movie: Movie,
    pub score: f32,
}

/// A movie paired with its mean rating, absent when it has no ratings
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatedMovie {
    pub movie: Movie,
    pub avg_rating: Option<f64>,
}

/// A movie with its rating count and mean rating
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PopularMovie {
    pub movie: Movie,
    pub avg_rating: f64,
    pub rating_count: usize,
}

/// Moves a trailing English article to the front ("Matrix, The" -> "The Matrix")
///
/// Presentation only; stored titles keep the catalog form.
pub fn format_title_for_display(title: &str) -> String {
    for article in ["The", "A", "An"] {
        let suffix = format!(", {}", article);
        if let Some(stem) = title.strip_suffix(&suffix) {
            return format!("{} {}", article, stem);
        }
    }
    title.to_string()
}
