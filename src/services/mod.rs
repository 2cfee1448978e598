pub mod loader;
pub mod recommender;
pub mod similarity;
pub mod snapshot;

use std::path::Path;

pub use recommender::{MovieRecommender, Recommender};
pub use similarity::SimilarityModel;

use crate::{error::AppResult, models::Dataset};

/// Loads the dataset, preferring an existing snapshot over the raw files
///
/// An unreadable snapshot is logged and the raw files are parsed instead.
/// When the raw files are parsed, a fresh snapshot is written; failing to
/// write it only logs a warning.
pub fn load_dataset(data_dir: &Path, snapshot_dir: &Path, rebuild: bool) -> AppResult<Dataset> {
    if !rebuild && snapshot::exists(snapshot_dir) {
        match snapshot::load(snapshot_dir) {
            Ok(dataset) => return Ok(dataset),
            Err(e) => tracing::warn!(
                error = %e,
                dir = %snapshot_dir.display(),
                "Dataset snapshot unreadable, re-parsing raw files"
            ),
        }
    }

    let dataset = loader::load_raw(data_dir)?;
    if let Err(e) = snapshot::save(&dataset, snapshot_dir) {
        tracing::warn!(error = %e, dir = %snapshot_dir.display(), "Failed to write dataset snapshot");
    }
    Ok(dataset)
}
