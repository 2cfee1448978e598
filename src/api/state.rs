use std::sync::Arc;

use crate::services::Recommender;

/// Shared application state
///
/// The recommender is fully built before the state is created and is only
/// read afterwards, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<dyn Recommender>,
}

impl AppState {
    /// Wraps a ready recommender for sharing across handlers
    pub fn new(recommender: Arc<dyn Recommender>) -> Self {
        Self { recommender }
    }
}
