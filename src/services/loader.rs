use chrono::DateTime;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{Dataset, FullRating, Movie, Rating, User},
};

pub const MOVIES_FILE: &str = "movies.dat";
pub const USERS_FILE: &str = "users.dat";
pub const RATINGS_FILE: &str = "ratings.dat";

const FIELD_SEPARATOR: &str = "::";
const GENRE_SEPARATOR: char = '|';

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(([0-9]{4})\)").expect("valid year pattern"))
}

fn trailing_year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*\([0-9]{4}\)\s*$").expect("valid trailing year pattern"))
}

/// Loads and normalizes the three raw MovieLens files from `data_dir`
///
/// Any missing file or malformed row aborts the whole load, so callers never
/// see a partially built dataset.
pub fn load_raw(data_dir: &Path) -> AppResult<Dataset> {
    let start = Instant::now();
    tracing::info!(data_dir = %data_dir.display(), "Loading raw MovieLens files");

    let movies = parse_movies(&read_latin1(&data_dir.join(MOVIES_FILE))?)?;
    let users = parse_users(&read_latin1(&data_dir.join(USERS_FILE))?)?;
    let ratings = parse_ratings(&read_latin1(&data_dir.join(RATINGS_FILE))?)?;
    let full = join_full(&movies, &users, &ratings);

    let dataset = Dataset {
        movies,
        users,
        ratings,
        full,
    };

    log_summary(&dataset);
    tracing::info!(
        processing_time_ms = start.elapsed().as_millis(),
        "Raw dataset loaded"
    );

    Ok(dataset)
}

/// Reads a file and decodes it as latin-1
pub fn read_latin1(path: &Path) -> AppResult<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read data file");
        e
    })?;
    // Every latin-1 byte is the code point of the same value
    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Parses `movies.dat` rows (`movieId::title::genres`), keeping the first row per id
pub fn parse_movies(source: &str) -> AppResult<Vec<Movie>> {
    let mut movies = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;

    for (line_no, line) in data_lines(source) {
        let fields = split_fields(MOVIES_FILE, line_no, line, 3)?;
        let movie_id = parse_number(MOVIES_FILE, line_no, "movieId", fields[0])?;
        let (title, year) = split_title_year(fields[1]);
        let genres = split_genres(fields[2]);

        if !seen.insert(movie_id) {
            duplicates += 1;
            continue;
        }
        movies.push(Movie::new(movie_id, title, year, genres));
    }

    if duplicates > 0 {
        tracing::info!(duplicates, "Removed duplicate movie entries");
    }

    Ok(movies)
}

/// Parses `users.dat` rows (`userId::gender::age::occupation::zip`), keeping the first row per id
pub fn parse_users(source: &str) -> AppResult<Vec<User>> {
    let mut users = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;
    let mut unmapped = 0usize;

    for (line_no, line) in data_lines(source) {
        let fields = split_fields(USERS_FILE, line_no, line, 5)?;
        let user_id = parse_number(USERS_FILE, line_no, "userId", fields[0])?;
        let age = parse_number(USERS_FILE, line_no, "age", fields[2])?;
        let occupation = parse_number(USERS_FILE, line_no, "occupation", fields[3])?;

        if !seen.insert(user_id) {
            duplicates += 1;
            continue;
        }

        let user = User::new(
            user_id,
            fields[1].trim().to_string(),
            age,
            occupation,
            fields[4].trim().to_string(),
        );
        if user.age_desc.is_none() || user.occupation_desc.is_none() {
            unmapped += 1;
        }
        users.push(user);
    }

    if duplicates > 0 {
        tracing::info!(duplicates, "Removed duplicate user entries");
    }
    if unmapped > 0 {
        tracing::warn!(unmapped, "Users with unmapped age or occupation codes");
    }

    Ok(users)
}

/// Parses `ratings.dat` rows (`userId::movieId::rating::timestamp`)
///
/// Duplicate `(userId, movieId)` pairs are dropped, first occurrence wins.
pub fn parse_ratings(source: &str) -> AppResult<Vec<Rating>> {
    let mut ratings = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;

    for (line_no, line) in data_lines(source) {
        let fields = split_fields(RATINGS_FILE, line_no, line, 4)?;
        let user_id = parse_number(RATINGS_FILE, line_no, "userId", fields[0])?;
        let movie_id = parse_number(RATINGS_FILE, line_no, "movieId", fields[1])?;
        let rating: f32 = parse_number(RATINGS_FILE, line_no, "rating", fields[2])?;
        let seconds: i64 = parse_number(RATINGS_FILE, line_no, "timestamp", fields[3])?;
        let timestamp = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            AppError::parse(RATINGS_FILE, line_no, format!("timestamp {} out of range", seconds))
        })?;

        if !seen.insert((user_id, movie_id)) {
            duplicates += 1;
            continue;
        }
        ratings.push(Rating {
            user_id,
            movie_id,
            rating,
            timestamp,
        });
    }

    if duplicates > 0 {
        tracing::info!(duplicates, "Removed duplicate rating entries");
    }

    Ok(ratings)
}

/// Inner-joins ratings with movies and then users, in ratings order
pub fn join_full(movies: &[Movie], users: &[User], ratings: &[Rating]) -> Vec<FullRating> {
    let movies_by_id: HashMap<u32, &Movie> = movies.iter().map(|m| (m.movie_id, m)).collect();
    let users_by_id: HashMap<u32, &User> = users.iter().map(|u| (u.user_id, u)).collect();

    let full: Vec<FullRating> = ratings
        .iter()
        .filter_map(|rating| {
            let movie = movies_by_id.get(&rating.movie_id)?;
            let user = users_by_id.get(&rating.user_id)?;
            Some(FullRating {
                rating: rating.clone(),
                movie: (*movie).clone(),
                user: (*user).clone(),
            })
        })
        .collect();

    let dropped = ratings.len() - full.len();
    if dropped > 0 {
        tracing::warn!(dropped, "Ratings without a matching movie or user dropped from join");
    }

    full
}

/// Splits a raw title into the bare title and its release year
fn split_title_year(raw: &str) -> (String, Option<i32>) {
    let year = year_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());
    let title = trailing_year_pattern().replace(raw, "").into_owned();
    (title, year)
}

fn split_genres(raw: &str) -> Vec<String> {
    raw.split(GENRE_SEPARATOR)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Non-blank lines with 1-based line numbers
fn data_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
}

fn split_fields<'a>(
    file: &str,
    line_no: usize,
    line: &'a str,
    expected: usize,
) -> AppResult<Vec<&'a str>> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() != expected {
        return Err(AppError::parse(
            file,
            line_no,
            format!("expected {} fields, found {}", expected, fields.len()),
        ));
    }
    Ok(fields)
}

fn parse_number<T>(file: &str, line_no: usize, field: &str, raw: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::parse(file, line_no, format!("invalid {} '{}': {}", field, raw, e)))
}

fn log_summary(dataset: &Dataset) {
    let mut genre_counts: HashMap<&str, usize> = HashMap::new();
    for genre in dataset.movies.iter().flat_map(|m| m.genres.iter()) {
        *genre_counts.entry(genre.as_str()).or_default() += 1;
    }
    let mut top: Vec<(&str, usize)> = genre_counts.into_iter().collect();
    top.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    let top_genres: Vec<&str> = top.iter().take(5).map(|(g, _)| *g).collect();

    tracing::info!(
        movies = dataset.movies.len(),
        users = dataset.users.len(),
        ratings = dataset.ratings.len(),
        joined = dataset.full.len(),
        mean_rating = dataset.mean_rating().unwrap_or_default(),
        top_genres = ?top_genres,
        "Dataset summary"
    );
}
