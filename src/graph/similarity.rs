//! Pairwise similarity between note embeddings.
//!
//! [`SimilarityMatrix`] holds the full cosine-similarity matrix indexed by
//! note title; [`SimilarityMatrix::stack`] flattens it into long-form
//! [`EdgeCandidate`]s and [`filter_links`] keeps the ones strong enough to
//! become edges.

use serde::{Deserialize, Serialize};

/// Cosine similarity of two vectors, accumulated in f64.
///
/// `None` when either vector has zero norm or the lengths differ; the result
/// is clamped to `[-1, 1]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return None;
    }
    Some((dot / (na * nb)).clamp(-1.0, 1.0))
}

fn norm(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt()
}

/// One (ordered) pair of titles and their similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeCandidate {
    pub var1: String,
    pub var2: String,
    /// `None` when the similarity is undefined
    pub value: Option<f64>,
}

impl EdgeCandidate {
    pub fn new(var1: impl Into<String>, var2: impl Into<String>, value: f64) -> Self {
        Self {
            var1: var1.into(),
            var2: var2.into(),
            value: Some(value),
        }
    }
}

/// Square, symmetric similarity matrix with rows and columns labelled by
/// note title, in note order.
///
/// Labels are not required to be unique. Two notes sharing a title keep
/// separate rows, but every candidate between them has `var1 == var2`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    labels: Vec<String>,
    values: Vec<Option<f64>>,
}

impl SimilarityMatrix {
    /// Compute all pairwise cosine similarities.
    ///
    /// The diagonal is exactly `1.0` for every non-zero vector. `labels` and
    /// `embeddings` must have the same length.
    pub fn from_embeddings(labels: Vec<String>, embeddings: &[Vec<f32>]) -> Self {
        debug_assert_eq!(labels.len(), embeddings.len());
        let n = embeddings.len();
        let mut values = vec![None; n * n];

        for i in 0..n {
            values[i * n + i] = if norm(&embeddings[i]) > 0.0 {
                Some(1.0)
            } else {
                None
            };
            for j in (i + 1)..n {
                let sim = cosine_similarity(&embeddings[i], &embeddings[j]);
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        Self { labels, values }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let n = self.len();
        if row >= n || col >= n {
            return None;
        }
        self.values[row * n + col]
    }

    /// Long-form view: one candidate per cell, self-pairs included (n²).
    pub fn stack(&self) -> Vec<EdgeCandidate> {
        let n = self.len();
        let mut out = Vec::with_capacity(n * n);
        for (i, var1) in self.labels.iter().enumerate() {
            for (j, var2) in self.labels.iter().enumerate() {
                out.push(EdgeCandidate {
                    var1: var1.clone(),
                    var2: var2.clone(),
                    value: self.values[i * n + j],
                });
            }
        }
        out
    }
}

/// Keep candidates with a defined value strictly above `cutoff` that link
/// two different titles.
pub fn filter_links(links: Vec<EdgeCandidate>, cutoff: f64) -> Vec<EdgeCandidate> {
    links
        .into_iter()
        .filter(|link| link.var1 != link.var2 && link.value.is_some_and(|v| v > cutoff))
        .collect()
}
