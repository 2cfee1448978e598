use ndarray::{Array2, ArrayView1, Axis};
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::Movie,
};

/// The 318-entry English stop word list; these words are never used as features
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter",
    "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his", "how", "however",
    "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its",
    "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly", "move",
    "much", "must", "my", "myself", "name", "namely", "neither", "never", "nevertheless", "next",
    "nine", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of",
    "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise",
    "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put",
    "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several",
    "she", "should", "show", "side", "since", "sincere", "six", "sixty", "so", "some", "somehow",
    "someone", "something", "sometime", "sometimes", "somewhere", "still", "such", "system",
    "take", "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence",
    "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they",
    "thick", "thin", "third", "this", "those", "though", "three", "through", "throughout", "thru",
    "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
    "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby",
    "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever",
    "whole", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you",
    "your", "yours", "yourself", "yourselves",
];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"))
}

fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Lowercased tokens of two or more word characters, stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !stop_words().contains(t))
        .map(str::to_string)
        .collect()
}

/// Genre TF-IDF vectors and the dense all-pairs cosine similarity matrix
///
/// Rows and columns follow the row order of the movie table the model was
/// built from. The matrix is O(movies²) in memory, which is fine at
/// MovieLens-1M scale but not for catalogs orders of magnitude larger.
#[derive(Debug, Clone)]
pub struct SimilarityModel {
    vocabulary: Vec<String>,
    matrix: Array2<f32>,
    movie_ids: Vec<u32>,
}

impl SimilarityModel {
    /// Builds the model from every movie's genre text
    ///
    /// Deterministic: the same table always yields the same matrix.
    pub fn build(movies: &[Movie]) -> AppResult<Self> {
        if movies.is_empty() {
            return Err(AppError::EmptyCatalog);
        }
        let start = Instant::now();

        let documents: Vec<Vec<String>> = movies.iter().map(|m| tokenize(&m.genre_text)).collect();

        let vocabulary: Vec<String> = documents
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for doc in &documents {
            let distinct: HashSet<usize> = doc.iter().map(|t| index[t.as_str()]).collect();
            for col in distinct {
                doc_freq[col] += 1;
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1
        let n = documents.len() as f32;
        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let mut features = Array2::<f32>::zeros((movies.len(), vocabulary.len()));
        for (row, doc) in documents.iter().enumerate() {
            for token in doc {
                let col = index[token.as_str()];
                features[[row, col]] += idf[col];
            }
        }

        let mut empty_rows = Vec::new();
        for (row, mut vector) in features.axis_iter_mut(Axis(0)).enumerate() {
            let norm = vector.dot(&vector).sqrt();
            if norm > 0.0 {
                vector.mapv_inplace(|x| x / norm);
            } else {
                empty_rows.push(row);
            }
        }

        let mut matrix = features.dot(&features.t());
        matrix.mapv_inplace(|x| x.clamp(0.0, 1.0));
        let size = movies.len();
        for i in 0..size {
            for j in (i + 1)..size {
                matrix[[j, i]] = matrix[[i, j]];
            }
            if !empty_rows.contains(&i) {
                matrix[[i, i]] = 1.0;
            }
        }

        tracing::info!(
            movies = size,
            vocabulary = vocabulary.len(),
            empty_genres = empty_rows.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Similarity model built"
        );

        Ok(Self {
            vocabulary,
            matrix,
            movie_ids: movies.iter().map(|m| m.movie_id).collect(),
        })
    }

    /// Scores of movie row `row` against every movie, itself included
    pub fn similarity(&self, row: usize) -> Option<ArrayView1<'_, f32>> {
        (row < self.len()).then(|| self.matrix.row(row))
    }

    /// Number of movies the model covers
    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }

    /// Sorted feature tokens
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Whether the model was built from a table with this exact row order
    pub fn is_built_for(&self, movies: &[Movie]) -> bool {
        self.movie_ids.len() == movies.len()
            && self
                .movie_ids
                .iter()
                .zip(movies)
                .all(|(id, movie)| *id == movie.movie_id)
    }
}
