use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{Dataset, FullRating, Movie, Rating, User},
};

pub const SNAPSHOT_FILE: &str = "dataset.bin";
const SNAPSHOT_TMP_FILE: &str = "dataset.bin.tmp";
pub const MOVIES_CSV: &str = "movies.csv";
pub const USERS_CSV: &str = "users.csv";
pub const RATINGS_CSV: &str = "ratings.csv";
pub const FULL_CSV: &str = "full.csv";

/// Whether a binary snapshot exists in `dir`
pub fn exists(dir: &Path) -> bool {
    dir.join(SNAPSHOT_FILE).is_file()
}

/// Writes the binary snapshot and the CSV exports into `dir`
///
/// The binary snapshot is written to a temporary file and renamed into place
/// only once fully flushed, so a failed write never leaves a truncated
/// `dataset.bin` behind.
pub fn save(dataset: &Dataset, dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(dir)?;

    let final_path = dir.join(SNAPSHOT_FILE);
    let tmp_path = dir.join(SNAPSHOT_TMP_FILE);
    if let Err(e) = write_binary(dataset, &tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    std::fs::rename(&tmp_path, &final_path)?;

    write_csv(&dir.join(MOVIES_CSV), dataset.movies.iter().map(MovieRow::from))?;
    write_csv(&dir.join(USERS_CSV), dataset.users.iter().map(UserRow::from))?;
    write_csv(&dir.join(RATINGS_CSV), dataset.ratings.iter().map(RatingRow::from))?;
    write_csv(&dir.join(FULL_CSV), dataset.full.iter().map(FullRow::from))?;

    tracing::info!(dir = %dir.display(), "Dataset snapshot written");
    Ok(())
}

/// Reads the binary snapshot from `dir`
pub fn load(dir: &Path) -> AppResult<Dataset> {
    let path = dir.join(SNAPSHOT_FILE);
    let reader = BufReader::new(File::open(&path)?);
    let dataset: Dataset = bincode::deserialize_from(reader)
        .map_err(|e| AppError::Snapshot(format!("{}: {}", path.display(), e)))?;

    tracing::info!(
        path = %path.display(),
        movies = dataset.movies.len(),
        ratings = dataset.ratings.len(),
        "Dataset snapshot loaded"
    );
    Ok(dataset)
}

fn write_binary(dataset: &Dataset, path: &Path) -> AppResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, dataset)?;
    let file = writer
        .into_inner()
        .map_err(|e| AppError::Snapshot(format!("{}: {}", path.display(), e.error())))?;
    file.sync_all()?;
    Ok(())
}

fn write_csv<T, I>(path: &Path, rows: I) -> AppResult<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

// Flat rows for the CSV exports; genre lists are pipe-joined again

#[derive(Serialize)]
struct MovieRow<'a> {
    movie_id: u32,
    title: &'a str,
    year: Option<i32>,
    genres: String,
    genre_text: &'a str,
}

impl<'a> From<&'a Movie> for MovieRow<'a> {
    fn from(movie: &'a Movie) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: &movie.title,
            year: movie.year,
            genres: movie.genres.join("|"),
            genre_text: &movie.genre_text,
        }
    }
}

#[derive(Serialize)]
struct UserRow<'a> {
    user_id: u32,
    gender: &'a str,
    age: u32,
    age_desc: Option<&'a str>,
    occupation: u32,
    occupation_desc: Option<&'a str>,
    zip_code: &'a str,
}

impl<'a> From<&'a User> for UserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            user_id: user.user_id,
            gender: &user.gender,
            age: user.age,
            age_desc: user.age_desc.as_deref(),
            occupation: user.occupation,
            occupation_desc: user.occupation_desc.as_deref(),
            zip_code: &user.zip_code,
        }
    }
}

#[derive(Serialize)]
struct RatingRow {
    user_id: u32,
    movie_id: u32,
    rating: f32,
    timestamp: String,
}

impl From<&Rating> for RatingRow {
    fn from(rating: &Rating) -> Self {
        Self {
            user_id: rating.user_id,
            movie_id: rating.movie_id,
            rating: rating.rating,
            timestamp: rating.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct FullRow<'a> {
    user_id: u32,
    movie_id: u32,
    rating: f32,
    timestamp: String,
    title: &'a str,
    year: Option<i32>,
    genres: String,
    gender: &'a str,
    age_desc: Option<&'a str>,
    occupation_desc: Option<&'a str>,
    zip_code: &'a str,
}

impl<'a> From<&'a FullRating> for FullRow<'a> {
    fn from(row: &'a FullRating) -> Self {
        Self {
            user_id: row.rating.user_id,
            movie_id: row.rating.movie_id,
            rating: row.rating.rating,
            timestamp: row.rating.timestamp.to_rfc3339(),
            title: &row.movie.title,
            year: row.movie.year,
            genres: row.movie.genres.join("|"),
            gender: &row.user.gender,
            age_desc: row.user.age_desc.as_deref(),
            occupation_desc: row.user.occupation_desc.as_deref(),
            zip_code: &row.user.zip_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader;

    fn dataset() -> Dataset {
        let movies = loader::parse_movies(
            "1::Toy Story (1995)::Animation|Children's|Comedy\n2::Jumanji (1995)::Adventure\n",
        )
        .unwrap();
        let users = loader::parse_users("1::F::1::10::48067\n").unwrap();
        let ratings = loader::parse_ratings("1::1::5::978300760\n1::2::3::978302109\n").unwrap();
        let full = loader::join_full(&movies, &users, &ratings);
        Dataset {
            movies,
            users,
            ratings,
            full,
        }
    }

    #[test]
    fn test_save_then_load_restores_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let original = dataset();

        assert!(!exists(dir.path()));
        save(&original, dir.path()).unwrap();
        assert!(exists(dir.path()));

        let restored = load(dir.path()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_save_writes_csv_exports() {
        let dir = tempfile::tempdir().unwrap();
        save(&dataset(), dir.path()).unwrap();

        let movies_csv = std::fs::read_to_string(dir.path().join(MOVIES_CSV)).unwrap();
        let mut lines = movies_csv.lines();
        assert_eq!(lines.next(), Some("movie_id,title,year,genres,genre_text"));
        assert_eq!(
            lines.next(),
            Some("1,Toy Story,1995,Animation|Children's|Comedy,Animation Children's Comedy")
        );

        let full_csv = std::fs::read_to_string(dir.path().join(FULL_CSV)).unwrap();
        assert_eq!(full_csv.lines().count(), 3);
        assert!(dir.path().join(USERS_CSV).is_file());
        assert!(dir.path().join(RATINGS_CSV).is_file());
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("processed_data");
        save(&dataset(), &nested).unwrap();
        assert!(exists(&nested));
    }

    #[test]
    fn test_load_missing_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(dir.path()), Err(AppError::Io(_))));
    }

    #[test]
    fn test_save_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        save(&dataset(), dir.path()).unwrap();
        assert!(!dir.path().join(SNAPSHOT_TMP_FILE).exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_save_reports_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("/dev/full", dir.path().join(SNAPSHOT_TMP_FILE)).unwrap();

        assert!(save(&dataset(), dir.path()).is_err());
        assert!(!exists(dir.path()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_save_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let original = dataset();
        save(&original, dir.path()).unwrap();

        std::os::unix::fs::symlink("/dev/full", dir.path().join(SNAPSHOT_TMP_FILE)).unwrap();
        assert!(save(&original, dir.path()).is_err());

        assert_eq!(load(dir.path()).unwrap(), original);
    }

    #[test]
    fn test_load_corrupt_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SNAPSHOT_FILE), b"not a snapshot").unwrap();
        assert!(matches!(load(dir.path()), Err(AppError::Snapshot(_))));
    }
}
