//! Vector tier for template retrieval
//!
//! [`VectorIndex`] is the seam for an external vector store. The bundled
//! [`InMemoryVectorIndex`] ranks by cosine similarity over embeddings from an
//! [`Embedder`]; [`HashingEmbedder`] needs no model and handles CJK text by
//! hashing character n-grams.

use super::corpus::TemplateCorpus;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("vector index unavailable: {0}")]
    Unavailable(String),

    #[error("embedding failed: {0}")]
    Embedding(String),
}

/// Nearest-neighbour lookup over template ids
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `k` template ids, closest first
    async fn nearest(&self, query: &str, k: usize) -> Result<Vec<String>, VectorIndexError>;

    /// Number of indexed documents
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorIndexError>;
}

/// Bag of character unigrams and bigrams hashed into a fixed number of buckets
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, gram: &str) -> usize {
        let digest = md5::compute(gram.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.0[..8]);
        (u64::from_le_bytes(bytes) % self.dimensions as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(512)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorIndexError> {
        let mut vector = vec![0.0f32; self.dimensions];
        let chars: Vec<char> = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();

        for c in &chars {
            vector[self.bucket(&c.to_string())] += 1.0;
        }
        for pair in chars.windows(2) {
            let gram: String = pair.iter().collect();
            vector[self.bucket(&gram)] += 1.0;
        }

        normalize(&mut vector);
        Ok(vector)
    }
}

/// Cosine-similarity index held in memory
pub struct InMemoryVectorIndex {
    embedder: Box<dyn Embedder>,
    entries: Vec<(String, Vec<f32>)>,
}

impl InMemoryVectorIndex {
    /// Embeds every template document in `corpus`
    pub fn build(
        corpus: &TemplateCorpus,
        embedder: Box<dyn Embedder>,
    ) -> Result<Self, VectorIndexError> {
        let entries = corpus
            .all()
            .iter()
            .map(|t| Ok((t.id.clone(), embedder.embed(&t.document())?)))
            .collect::<Result<Vec<_>, VectorIndexError>>()?;

        debug!("Indexed {} template documents", entries.len());
        Ok(Self { embedder, entries })
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn nearest(&self, query: &str, k: usize) -> Result<Vec<String>, VectorIndexError> {
        let query_vector = self.embedder.embed(query)?;

        let mut scored: Vec<(&str, f32)> = self
            .entries
            .iter()
            .map(|(id, v)| (id.as_str(), cosine(&query_vector, v)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(id, _)| id.to_string())
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
