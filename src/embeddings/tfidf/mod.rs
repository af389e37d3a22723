
mod stop_words;

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use fancy_regex::Regex;
use tracing::{debug, warn};

pub use stop_words::{ENGLISH_STOP_WORDS, is_stop_word};

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern should compile"));

/// Lowercase the text and split it into word tokens of two or more characters,
/// dropping English stop words
#[inline]
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();

    for found in TOKEN_PATTERN.find_iter(&lowered) {
        match found {
            Ok(m) => {
                if !is_stop_word(m.as_str()) {
                    tokens.push(m.as_str().to_string());
                }
            }
            Err(e) => {
                // Only backtracking limits can fail here; keep what we have
                warn!("Tokenizer stopped early: {}", e);
                break;
            }
        }
    }

    tokens
}

/// Unfitted TF-IDF vectorizer with a bounded vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TfidfVectorizer {
    max_features: usize,
}

/// Vocabulary and inverse document frequencies learned from a corpus
#[derive(Debug, Clone, PartialEq)]
pub struct FittedTfidf {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    documents_seen: usize,
}

impl TfidfVectorizer {
    #[inline]
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    #[inline]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Learn the vocabulary and IDF weights from the corpus.
    ///
    /// Keeps the `max_features` terms with the highest total count (ties go to
    /// the alphabetically smaller term) and indexes them alphabetically.
    /// Returns `None` when no token survives stop-word filtering.
    #[inline]
    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> Option<FittedTfidf> {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for document in corpus {
            let mut seen_in_document: HashMap<String, usize> = HashMap::new();
            for token in tokenize(document.as_ref()) {
                *seen_in_document.entry(token).or_default() += 1;
            }
            for (term, count) in seen_in_document {
                *term_counts.entry(term.clone()).or_default() += count;
                *document_frequency.entry(term).or_default() += 1;
            }
        }

        if term_counts.is_empty() {
            debug!("Corpus of {} documents has an empty vocabulary", corpus.len());
            return None;
        }

        let mut ranked = term_counts.into_iter().collect::<Vec<_>>();
        ranked.sort_by(|(a_term, a_count), (b_term, b_count)| {
            b_count.cmp(a_count).then_with(|| a_term.cmp(b_term))
        });
        ranked.truncate(self.max_features);

        let kept = ranked
            .into_iter()
            .map(|(term, _)| term)
            .collect::<BTreeSet<_>>();

        let n_documents = corpus.len() as f64;
        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (index, term) in kept.into_iter().enumerate() {
            let df = document_frequency.get(&term).copied().unwrap_or_default() as f64;
            idf.push(((1.0 + n_documents) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        debug!(
            "Fitted TF-IDF over {} documents with {} features",
            corpus.len(),
            vocabulary.len()
        );

        Some(FittedTfidf {
            vocabulary,
            idf,
            documents_seen: corpus.len(),
        })
    }
}

impl FittedTfidf {
    /// Model with no features, for corpora made only of stop words
    #[inline]
    pub fn empty(documents_seen: usize) -> Self {
        Self {
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            documents_seen,
        }
    }

    /// Number of features learned, which may be below `max_features`
    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    #[inline]
    pub fn documents_seen(&self) -> usize {
        self.documents_seen
    }

    /// L2-normalized TF-IDF row for a single text, `vocabulary_size()` wide
    #[inline]
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut row = vec![0.0_f64; self.idf.len()];
        for token in tokenize(text) {
            if let Some(&column) = self.vocabulary.get(&token) {
                row[column] += 1.0;
            }
        }

        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut row {
                *value /= norm;
            }
        }

        row.into_iter().map(|v| v as f32).collect()
    }
}
