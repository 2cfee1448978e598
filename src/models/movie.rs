use serde::{Deserialize, Serialize};

/// A movie from the catalog, normalized from the raw `movies.dat` row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Unique identifier for the movie
    pub movie_id: u32,
    /// Title with the trailing release-year annotation removed
    pub title: String,
    /// Release year, absent when the raw title carries no `(YYYY)`
    pub year: Option<i32>,
    /// Genre tags in source order
    pub genres: Vec<String>,
    /// Space-joined genre tags, input to the similarity model
    pub genre_text: String,
}

impl Movie {
    /// Creates a movie, deriving the genre text from the genre list
    pub fn new(movie_id: u32, title: String, year: Option<i32>, genres: Vec<String>) -> Self {
        let genre_text = genre_text(&genres);
        Self {
            movie_id,
            title,
            year,
            genres,
            genre_text,
        }
    }

    /// Checks whether the title contains `query`, ignoring case
    pub fn title_matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }

    /// Checks whether the genre text contains any of `genres`, ignoring case
    pub fn matches_any_genre<S: AsRef<str>>(&self, genres: &[S]) -> bool {
        let text = self.genre_text.to_lowercase();
        genres
            .iter()
            .map(|g| g.as_ref().trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .any(|g| text.contains(&g))
    }
}

/// Joins genre tags with single spaces
pub fn genre_text<S: AsRef<str>>(genres: &[S]) -> String {
    genres
        .iter()
        .map(|g| g.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_story() -> Movie {
        Movie::new(
            1,
            "Toy Story".to_string(),
            Some(1995),
            vec![
                "Animation".to_string(),
                "Children's".to_string(),
                "Comedy".to_string(),
            ],
        )
    }

    #[test]
    fn test_new_derives_genre_text() {
        assert_eq!(toy_story().genre_text, "Animation Children's Comedy");
    }

    #[test]
    fn test_genre_text_is_deterministic() {
        let movie = toy_story();
        assert_eq!(genre_text(&movie.genres), movie.genre_text);
        assert_eq!(genre_text(&movie.genres), genre_text(&movie.genres));
    }

    #[test]
    fn test_empty_genres_yield_empty_text() {
        let movie = Movie::new(7, "Untitled".to_string(), None, Vec::new());
        assert_eq!(movie.genre_text, "");
        assert!(!movie.matches_any_genre(&["Comedy"]));
    }

    #[test]
    fn test_title_matches_case_insensitive() {
        let movie = toy_story();
        assert!(movie.title_matches("toy"));
        assert!(movie.title_matches("STORY"));
        assert!(!movie.title_matches("Jumanji"));
    }

    #[test]
    fn test_matches_any_genre_or_semantics() {
        let movie = toy_story();
        assert!(movie.matches_any_genre(&["comedy"]));
        assert!(movie.matches_any_genre(&["Horror", "Animation"]));
        assert!(!movie.matches_any_genre(&["Horror", "Western"]));
    }

    #[test]
    fn test_matches_any_genre_ignores_blank_entries() {
        let movie = toy_story();
        assert!(!movie.matches_any_genre(&["", "  "]));
    }
}
