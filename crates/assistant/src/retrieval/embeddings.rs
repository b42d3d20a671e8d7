//! Embedding providers.
//!
//! [`OpenAiEmbedder`] calls the `OpenAI` embeddings endpoint
//! (`text-embedding-3-small`, 1536 dimensions by default).
//! [`HashingEmbedder`] is an offline feature-hashing embedder: deterministic,
//! dependency-free and good enough for development and tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::EmbeddingError;

/// Default `OpenAI` embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Dimensions produced by [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Text → fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier.
    fn model(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or returns a vector of the
    /// wrong length.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Client for the `OpenAI` embeddings API.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    inner: Arc<OpenAiEmbedderInner>,
}

struct OpenAiEmbedderInner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Create a new embedding client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(
        api_key: &SecretString,
        base_url: &str,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| {
                EmbeddingError::Config("API key contains invalid header characters".to_string())
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(OpenAiEmbedderInner {
                client,
                endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
                model: model.into(),
                dimensions,
            }),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.inner.model
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest::new(&self.inner.model, text, self.inner.dimensions);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: EmbeddingResponse = response.json().await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse("No embedding data in response".to_string())
            })?
            .embedding;

        check_dimensions(self.inner.dimensions, embedding)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl<'a> EmbeddingRequest<'a> {
    /// `text-embedding-ada-002` rejects the `dimensions` parameter; newer
    /// models shorten their output to it.
    fn new(model: &'a str, input: &'a str, dimensions: usize) -> Self {
        let dimensions = (!model.starts_with("text-embedding-ada")).then_some(dimensions);
        Self {
            model,
            input,
            dimensions,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Deterministic feature-hashing embedder.
///
/// Each lower-cased token is hashed with 64-bit FNV-1a into one of
/// `dimensions` buckets, with the sign taken from a high hash bit. The
/// bucket counts are L2-normalised, so identical texts score exactly 1.0.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl HashingEmbedder {
    /// Model identifier reported by [`Embedder::model`].
    pub const MODEL: &'static str = "feature-hashing-fnv1a";

    /// Create an embedder with the given number of buckets (at least 1).
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Synchronous embedding.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];

        for token in text.split_whitespace() {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            // `dimensions` fits in u64 and the remainder fits back in usize.
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            if let Some(slot) = vector.get_mut(bucket) {
                *slot += sign;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model(&self) -> &str {
        Self::MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_sync(text))
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Reject vectors whose length differs from `expected`.
///
/// # Errors
///
/// Returns [`EmbeddingError::DimensionMismatch`] on a length mismatch.
pub fn check_dimensions(expected: usize, vector: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
    if vector.len() == expected {
        Ok(vector)
    } else {
        Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: vector.len(),
        })
    }
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or a
/// zero-norm operand.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_configured_dimensions() {
        let json =
            serde_json::to_value(EmbeddingRequest::new("text-embedding-3-small", "x", 512))
                .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "text-embedding-3-small", "input": "x", "dimensions": 512})
        );

        let json =
            serde_json::to_value(EmbeddingRequest::new("text-embedding-ada-002", "x", 1536))
                .unwrap();
        assert!(json.get("dimensions").is_none());
    }

    #[test]
    fn test_default_model_constants() {
        assert_eq!(DEFAULT_EMBEDDING_MODEL, "text-embedding-3-small");
        assert_eq!(DEFAULT_EMBEDDING_DIMENSIONS, 1536);
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_hashing_embedder_is_deterministic_and_normalised() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_sync("Safety stock buffers against demand spikes");
        let b = embedder.embed_sync("safety STOCK buffers against demand spikes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hashing_embedder_empty_text() {
        let v = HashingEmbedder::new(8).embed_sync("   ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_related_texts_score_higher() {
        let embedder = HashingEmbedder::new(256);
        let query = embedder.embed_sync("what is lead time");
        let related = embedder.embed_sync("lead time is the delay between ordering and receiving");
        let unrelated = embedder.embed_sync("quarterly marketing calendar");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[], &[]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(3, vec![0.0; 3]).is_ok());
        assert!(matches!(
            check_dimensions(3, vec![0.0; 2]),
            Err(EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_hashing_embedder_trait() {
        let embedder = HashingEmbedder::new(0);
        assert_eq!(embedder.dimensions(), 1);
        assert_eq!(embedder.model(), HashingEmbedder::MODEL);
        assert_eq!(embedder.embed("x").await.expect("embed").len(), 1);
    }
}
