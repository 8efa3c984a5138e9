//! Deterministic hash-based embeddings for dev/test
//!
//! Produces consistent vectors so search tests return predictable results.
//! Not suitable for production retrieval quality.

use async_trait::async_trait;
use sha2::{Digest, Sha512};

use crate::error::Result;

use super::EmbeddingProvider;

/// Hash-based stub provider
///
/// The sha512 digest of the input is repeated to fill `dim * 4` bytes,
/// reinterpreted as `dim` little-endian f32 values and normalized to unit
/// length. A zero vector is returned only when the norm is zero.
#[derive(Debug, Clone)]
pub struct StubEmbedding {
    dim: usize,
}

impl StubEmbedding {
    #[must_use]
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedding {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn dimensions(&self) -> usize {
        self.dim
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let digest = Sha512::digest(text.as_bytes());

        let needed = self.dim * 4;
        let mut expanded = Vec::with_capacity(needed);
        while expanded.len() < needed {
            expanded.extend_from_slice(&digest);
        }
        expanded.truncate(needed);

        let floats: Vec<f32> = expanded
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let magnitude = floats
            .iter()
            .map(|f| f64::from(*f) * f64::from(*f))
            .sum::<f64>()
            .sqrt();
        if magnitude == 0.0 {
            return Ok(vec![0.0; self.dim]);
        }

        Ok(floats
            .into_iter()
            .map(|f| (f64::from(f) / magnitude) as f32)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn norm(vec: &[f32]) -> f64 {
        vec.iter()
            .map(|f| f64::from(*f) * f64::from(*f))
            .sum::<f64>()
            .sqrt()
    }

    #[tokio::test]
    async fn same_text_yields_identical_vectors() {
        let provider = StubEmbedding::new(1536);
        let a = provider.embed("docker push fix").await.unwrap();
        let b = provider.embed("docker push fix").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1536);
    }

    #[tokio::test]
    async fn different_text_yields_different_vectors() {
        let provider = StubEmbedding::new(64);
        let a = provider.embed("alpha").await.unwrap();
        let b = provider.embed("beta").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_unit_norm() {
        let provider = StubEmbedding::new(1536);
        for text in ["", "hello", "a longer piece of text with several words"] {
            let vec = provider.embed(text).await.unwrap();
            assert!((norm(&vec) - 1.0).abs() < 1e-6, "norm off for {text:?}");
        }
    }

    #[tokio::test]
    async fn dimension_shorter_than_digest_truncates() {
        let provider = StubEmbedding::new(8);
        let vec = provider.embed("hello").await.unwrap();
        assert_eq!(vec.len(), 8);
        assert!((norm(&vec) - 1.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn arbitrary_inputs_stay_unit_norm(text in ".{0,200}") {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let vec = rt
                .block_on(StubEmbedding::new(384).embed(&text))
                .unwrap();
            prop_assert_eq!(vec.len(), 384);
            prop_assert!((norm(&vec) - 1.0).abs() < 1e-6);
        }
    }
}
