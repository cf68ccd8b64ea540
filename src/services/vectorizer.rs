use ndarray::Array1;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};

/// Normalization applied to a projected vector
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// A fitted TF-IDF text vectorizer
///
/// The vocabulary and idf weights are produced by the offline fitting step and
/// never change while the service runs. Terms outside the vocabulary are
/// ignored, so text made only of unknown words projects to the zero vector.
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
    #[serde(default)]
    sublinear_tf: bool,
}

fn default_lowercase() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

impl TfidfVectorizer {
    /// Creates a unigram, lowercasing, l2-normalized vectorizer
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f32>) -> AppResult<Self> {
        let vectorizer = Self {
            vocabulary,
            idf,
            lowercase: default_lowercase(),
            ngram_range: default_ngram_range(),
            norm: default_norm(),
            sublinear_tf: false,
        };
        vectorizer.validate()?;
        Ok(vectorizer)
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> AppResult<Self> {
        self.ngram_range = (min_n, max_n);
        self.validate()?;
        Ok(self)
    }

    pub fn with_norm(mut self, norm: Option<Norm>) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    /// Checks that the fitted state is internally consistent
    pub fn validate(&self) -> AppResult<()> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(AppError::Artifact(format!(
                "vectorizer has {} idf weights for {} vocabulary terms",
                self.idf.len(),
                self.vocabulary.len()
            )));
        }

        if let Some((term, index)) = self
            .vocabulary
            .iter()
            .find(|(_, index)| **index >= self.idf.len())
        {
            return Err(AppError::Artifact(format!(
                "vocabulary term '{}' has out-of-range index {}",
                term, index
            )));
        }

        if let Some(index) = self.idf.iter().position(|weight| !weight.is_finite()) {
            return Err(AppError::Artifact(format!(
                "idf weight {} at index {} is not finite",
                self.idf[index], index
            )));
        }

        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(AppError::Artifact(format!(
                "invalid ngram range ({}, {})",
                min_n, max_n
            )));
        }

        Ok(())
    }

    /// Dimension of every projected vector
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Projects text into the fitted vector space
    pub fn transform(&self, text: &str) -> Array1<f32> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in self.terms(&self.tokenize(text)) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = Array1::<f32>::zeros(self.dimension());
        for (index, count) in counts {
            let tf = if self.sublinear_tf { 1.0 + count.ln() } else { count };
            vector[index] = tf * self.idf[index];
        }

        let length = match self.norm {
            Some(Norm::L2) => vector.dot(&vector).sqrt(),
            Some(Norm::L1) => vector.iter().map(|v| v.abs()).sum(),
            None => 0.0,
        };
        if length > 0.0 {
            vector.mapv_inplace(|v| v / length);
        }

        vector
    }

    /// Splits text into word tokens of two or more characters
    fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .map(str::to_string)
            .collect()
    }

    /// Expands tokens into space-joined word n-grams
    fn terms(&self, tokens: &[String]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let max_n = max_n.min(tokens.len());

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }
}
