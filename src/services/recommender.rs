use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

use crate::{
    error::{AppError, AppResult},
    models::{Dataset, DatasetStats, PopularMovie, RatedMovie, SimilarMovie},
    services::similarity::SimilarityModel,
};

/// Minimum number of ratings for a movie to count as popular
pub const POPULAR_MIN_RATINGS: usize = 100;

/// Read-only recommendation queries
///
/// Implementations are built once and shared across requests, so every method
/// takes `&self` and keeps its scratch state local to the call.
#[cfg_attr(test, automock)]
pub trait Recommender: Send + Sync {
    /// Movies most similar by genre to the first title containing `title_query`
    ///
    /// Returns `None` when no title matches. A matched movie may still yield
    /// an empty list when the catalog holds nothing else. The matched movie
    /// itself is never part of the result.
    fn find_similar_movies(&self, title_query: &str, n: usize) -> Option<Vec<SimilarMovie>>;

    /// Best-rated movies having any of `genres`, unrated movies last
    fn recommend_by_genres(&self, genres: &[String], n: usize) -> Vec<RatedMovie>;

    /// Best-rated movies with at least [`POPULAR_MIN_RATINGS`] ratings
    fn popular_movies(&self, n: usize) -> Vec<PopularMovie>;

    /// Distinct genre tags in the catalog, sorted
    fn genres(&self) -> Vec<String>;

    /// Dataset summary counts
    fn stats(&self) -> DatasetStats;
}

#[derive(Debug, Clone, Copy, Default)]
struct RatingAggregate {
    count: usize,
    sum: f64,
}

impl RatingAggregate {
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Content-based recommender over an immutable dataset
///
/// Lifecycle: load a [`Dataset`], build a [`SimilarityModel`] from its movie
/// table, then hand both to [`MovieRecommender::new`]. After that the value is
/// read-only and can be shared behind an `Arc`.
pub struct MovieRecommender {
    dataset: Dataset,
    model: SimilarityModel,
    /// Per movie row, aligned with `dataset.movies`
    aggregates: Vec<RatingAggregate>,
    genres: Vec<String>,
    stats: DatasetStats,
}

impl MovieRecommender {
    /// Creates a recommender from a dataset and a model built from its movies
    pub fn new(dataset: Dataset, model: SimilarityModel) -> AppResult<Self> {
        if !model.is_built_for(&dataset.movies) {
            return Err(AppError::Internal(
                "Similarity model does not match the movie table".to_string(),
            ));
        }

        let aggregates = aggregate_ratings(&dataset);
        let genres = dataset.genres();
        let stats = DatasetStats::from(&dataset);

        tracing::info!(
            movies = stats.movie_count,
            ratings = stats.rating_count,
            genres = genres.len(),
            "Recommender ready"
        );

        Ok(Self {
            dataset,
            model,
            aggregates,
            genres,
            stats,
        })
    }

    /// Builds the similarity model and the recommender in one step
    pub fn from_dataset(dataset: Dataset) -> AppResult<Self> {
        let model = SimilarityModel::build(&dataset.movies)?;
        Self::new(dataset, model)
    }

    /// Rebuilds the similarity model from the current movie table
    pub fn rebuild_similarity(&mut self) -> AppResult<()> {
        self.model = SimilarityModel::build(&self.dataset.movies)?;
        Ok(())
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn model(&self) -> &SimilarityModel {
        &self.model
    }
}

fn aggregate_ratings(dataset: &Dataset) -> Vec<RatingAggregate> {
    let rows: HashMap<u32, usize> = dataset
        .movies
        .iter()
        .enumerate()
        .map(|(row, m)| (m.movie_id, row))
        .collect();

    let mut aggregates = vec![RatingAggregate::default(); dataset.movies.len()];
    for rating in &dataset.ratings {
        if let Some(&row) = rows.get(&rating.movie_id) {
            aggregates[row].count += 1;
            aggregates[row].sum += rating.rating as f64;
        }
    }
    aggregates
}

impl Recommender for MovieRecommender {
    fn find_similar_movies(&self, title_query: &str, n: usize) -> Option<Vec<SimilarMovie>> {
        // First match in table order wins
        let Some(query_row) = self
            .dataset
            .movies
            .iter()
            .position(|m| m.title_matches(title_query))
        else {
            tracing::debug!(query = %title_query, "No movie matches title query");
            return None;
        };

        let Some(scores) = self.model.similarity(query_row) else {
            return Some(Vec::new());
        };

        let mut ranked: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(row, _)| *row != query_row)
            .collect();
        // Stable sort keeps row order among equal scores
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        tracing::debug!(
            query = %title_query,
            matched = %self.dataset.movies[query_row].title,
            "Similar movies ranked"
        );

        let results = ranked
            .into_iter()
            .take(n)
            .map(|(row, score)| SimilarMovie {
                movie: self.dataset.movies[row].clone(),
                score,
            })
            .collect();
        Some(results)
    }

    fn recommend_by_genres(&self, genres: &[String], n: usize) -> Vec<RatedMovie> {
        let mut matches: Vec<(usize, Option<f64>)> = self
            .dataset
            .movies
            .iter()
            .enumerate()
            .filter(|(_, m)| m.matches_any_genre(genres))
            .map(|(row, _)| (row, self.aggregates[row].mean()))
            .collect();

        // Descending by mean, unrated last, stable on row order
        matches.sort_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        tracing::debug!(genres = ?genres, matched = matches.len(), "Genre filter applied");

        matches
            .into_iter()
            .take(n)
            .map(|(row, avg_rating)| RatedMovie {
                movie: self.dataset.movies[row].clone(),
                avg_rating,
            })
            .collect()
    }

    fn popular_movies(&self, n: usize) -> Vec<PopularMovie> {
        let mut popular: Vec<(usize, usize, f64)> = self
            .aggregates
            .iter()
            .enumerate()
            .filter(|(_, agg)| agg.count >= POPULAR_MIN_RATINGS)
            .filter_map(|(row, agg)| agg.mean().map(|mean| (row, agg.count, mean)))
            .collect();

        popular.sort_by_key(|(row, _, _)| self.dataset.movies[*row].movie_id);
        popular.sort_by(|a, b| b.2.total_cmp(&a.2));

        popular
            .into_iter()
            .take(n)
            .map(|(row, rating_count, avg_rating)| PopularMovie {
                movie: self.dataset.movies[row].clone(),
                avg_rating,
                rating_count,
            })
            .collect()
    }

    fn genres(&self) -> Vec<String> {
        self.genres.clone()
    }

    fn stats(&self) -> DatasetStats {
        self.stats.clone()
    }
}
