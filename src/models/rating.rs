use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Movie, User};

/// A single rating event, unique per `(user_id, movie_id)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub user_id: u32,
    pub movie_id: u32,
    /// Star rating on the 1-5 scale
    pub rating: f32,
    pub timestamp: DateTime<Utc>,
}

/// One row of the denormalized ratings ⋈ movies ⋈ users view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FullRating {
    pub rating: Rating,
    pub movie: Movie,
    pub user: User,
}
