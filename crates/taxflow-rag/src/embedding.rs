use async_trait::async_trait;
use std::collections::HashMap;
use taxflow_core::{TaxflowError, TaxflowResult};

/// Trait for computing text embeddings (vector representations).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding vector for a single text.
    async fn embed(&self, text: &str) -> TaxflowResult<Vec<f32>>;

    /// Compute embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[&str]) -> TaxflowResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the vectors produced by this provider.
    fn dimension(&self) -> usize;
}

/// Weight of an adjacent-token pair relative to a single token.
const BIGRAM_WEIGHT: f32 = 0.5;

/// Local feature-hashing embedding (no external API needed).
///
/// Tokens and adjacent token pairs are hashed into a fixed-size vector with a
/// hash-derived sign, weighted by sublinear term frequency and L2-normalised.
/// Form identifiers such as `W-2` or `1099-INT` stay single tokens, so
/// `W-2` and `W-4` land on unrelated features.
pub struct LocalEmbedding {
    dimension: usize,
}

impl LocalEmbedding {
    /// Create an embedder producing vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a64(feature.as_bytes());
        let index = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> TaxflowResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(TaxflowError::Retrieval("cannot embed empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);

        let mut unigrams: HashMap<&str, u32> = HashMap::new();
        for token in &tokens {
            *unigrams.entry(token.as_str()).or_insert(0) += 1;
        }
        let mut bigrams: HashMap<String, u32> = HashMap::new();
        for pair in tokens.windows(2) {
            *bigrams.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
        }

        for (token, count) in &unigrams {
            self.add_feature(&mut vector, token, sublinear_tf(*count));
        }
        for (pair, count) in &bigrams {
            self.add_feature(&mut vector, pair, sublinear_tf(*count) * BIGRAM_WEIGHT);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Lowercased tokens. Hyphenated words containing a digit (`w-2`,
/// `1099-int`, `1040-sr`) are kept whole; other hyphenated words are split.
fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    for piece in lowered.split(|c: char| !c.is_alphanumeric() && c != '-') {
        let piece = piece.trim_matches('-');
        if piece.is_empty() {
            continue;
        }
        if !piece.contains('-') || piece.chars().any(|c| c.is_ascii_digit()) {
            tokens.push(piece.to_string());
        } else {
            tokens.extend(
                piece
                    .split('-')
                    .filter(|part| !part.is_empty())
                    .map(str::to_string),
            );
        }
    }
    tokens
}

fn sublinear_tf(count: u32) -> f32 {
    1.0 + (count as f32).ln()
}

/// FNV-1a, 64 bit.
fn fnv1a64(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in data {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::cosine_similarity;

    #[tokio::test]
    async fn test_dimension() {
        let emb = LocalEmbedding::new(128);
        assert_eq!(emb.dimension(), 128);
        assert_eq!(emb.embed("income tax brackets").await.unwrap().len(), 128);
    }

    #[tokio::test]
    async fn test_normalized() {
        let emb = LocalEmbedding::default();
        let v = emb.embed("standard deduction for single filers").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_related_texts_are_closer() {
        let emb = LocalEmbedding::default();
        let a = emb.embed("standard deduction single filer").await.unwrap();
        let b = emb.embed("standard deduction married filer").await.unwrap();
        let c = emb.embed("quarterly estimated payment vouchers").await.unwrap();
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn test_tokenize_keeps_form_identifiers() {
        assert_eq!(
            tokenize("Form W-2, 1099-INT and Schedule C; self-employment -- tax 1040-SR"),
            vec![
                "form", "w-2", "1099-int", "and", "schedule", "c", "self", "employment", "tax",
                "1040-sr"
            ]
        );
        assert!(tokenize("-- , ;").is_empty());
    }

    #[tokio::test]
    async fn test_form_identifiers_are_distinct() {
        let emb = LocalEmbedding::new(4096);
        let w2 = emb.embed("W-2").await.unwrap();
        let w4 = emb.embed("W-4").await.unwrap();
        assert_ne!(w2, w4);

        let query = emb.embed("W-2 wages").await.unwrap();
        let wage_statement = emb.embed("Form W-2 wage and tax statement").await.unwrap();
        let withholding = emb
            .embed("Form W-4 employee withholding certificate")
            .await
            .unwrap();
        assert!(cosine_similarity(&query, &wage_statement) > cosine_similarity(&query, &withholding));
    }

    #[tokio::test]
    async fn test_punctuation_only_text_embeds_to_zero() {
        let emb = LocalEmbedding::new(64);
        let v = emb.embed("-- ;").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let emb = LocalEmbedding::default();
        assert!(emb.embed("").await.is_err());
        assert!(emb.embed("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_deterministic_and_batch() {
        let emb = LocalEmbedding::default();
        let v1 = emb.embed("form 1040").await.unwrap();
        let batch = emb.embed_batch(&["form 1040", "schedule c"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], v1);
    }
}
