//! TF-IDF text vectorizer.
//!
//! Fit builds a `Vocabulary` once per training run. Transform turns one
//! description into a fixed-length vector over that vocabulary.
//!
//! Weighting:
//! - tf(t, d)  = count of t in d / number of in-vocabulary tokens in d
//! - idf(t)    = ln((1 + N) / (1 + df(t))) + 1   (smoothed, never zero)
//! - value     = tf × idf, no row normalisation
//!
//! Terms are kept in first-seen order up to `max_features`. Digit-only
//! tokens are identifiers, not vocabulary, and never become terms. Terms
//! found in every document of a multi-document corpus are dropped at fit
//! time; they carry no class signal, only document length.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// Default cap on vocabulary size
pub const DEFAULT_MAX_FEATURES: usize = 1000;

/// Tokens shorter than this are dropped
const MIN_TOKEN_LEN: usize = 2;

/// Fixed English stop-word list
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "itself", "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Numeric feature vector; length always equals the vocabulary size
pub type FeatureVector = Vec<f64>;

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

fn is_identifier(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit())
}

/// Lowercase, strip punctuation, split on whitespace, drop short tokens,
/// digit-only identifiers and stop words
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .filter(|t| !is_identifier(t))
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// One vocabulary entry as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub term: String,
    pub idf: f64,
}

/// Term → index map plus per-term idf, fixed after fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TermWeight>", into = "Vec<TermWeight>")]
pub struct Vocabulary {
    entries: Vec<TermWeight>,
    index: HashMap<String, usize>,
}

impl From<Vec<TermWeight>> for Vocabulary {
    fn from(entries: Vec<TermWeight>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.term.clone(), i))
            .collect();
        Self { entries, index }
    }
}

impl From<Vocabulary> for Vec<TermWeight> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.entries
    }
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index_of(term).map(|i| self.entries[i].idf)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.term.as_str())
    }

    /// Vectorize one description. Unknown terms are dropped before
    /// counting, so they do not dilute known ones; input with no known
    /// term yields the zero vector.
    pub fn transform(&self, text: &str) -> FeatureVector {
        let mut vector = vec![0.0; self.len()];
        let known: Vec<usize> = tokenize(text)
            .iter()
            .filter_map(|token| self.index_of(token))
            .collect();
        if known.is_empty() {
            return vector;
        }

        let total = known.len() as f64;
        for &i in &known {
            vector[i] += 1.0;
        }
        for (value, entry) in vector.iter_mut().zip(&self.entries) {
            if *value > 0.0 {
                *value = *value / total * entry.idf;
            }
        }
        vector
    }

    pub fn transform_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<FeatureVector> {
        texts.iter().map(|t| self.transform(t.as_ref())).collect()
    }

    /// SHA-256 over ordered terms and idf bits; pairs a vocabulary with the
    /// model trained on it
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in &self.entries {
            hasher.update(entry.term.as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.idf.to_bits().to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Smoothed inverse document frequency
pub fn smoothed_idf(n_docs: usize, doc_freq: usize) -> f64 {
    ((1.0 + n_docs as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
}

/// Fit-time settings
#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    pub max_features: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Build the vocabulary from a training corpus
    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> Vocabulary {
        let mut order: Vec<String> = Vec::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in corpus {
            let tokens = tokenize(doc.as_ref());
            // Text order, so first-seen order is stable
            for token in &tokens {
                if !doc_freq.contains_key(token) {
                    order.push(token.clone());
                    doc_freq.insert(token.clone(), 0);
                }
            }
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                if let Some(df) = doc_freq.get_mut(token) {
                    *df += 1;
                }
            }
        }

        let n_docs = corpus.len();
        let ubiquitous = |term: &String| n_docs > 1 && doc_freq.get(term) == Some(&n_docs);
        let dropped = order.iter().filter(|t| ubiquitous(*t)).count();
        let entries: Vec<TermWeight> = order
            .into_iter()
            .filter(|t| !ubiquitous(t))
            .take(self.max_features)
            .map(|term| {
                let df = doc_freq.get(&term).copied().unwrap_or(0);
                TermWeight {
                    idf: smoothed_idf(n_docs, df),
                    term,
                }
            })
            .collect();

        tracing::debug!(
            "Vectorizer fit: {} documents, {} terms kept (cap {}), {} ubiquitous dropped",
            n_docs,
            entries.len(),
            self.max_features,
            dropped
        );

        Vocabulary::from(entries)
    }
}
