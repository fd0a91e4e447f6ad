//! Embedding providers used by the knowledge bases

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const DEFAULT_EMBEDDINGS_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDINGS_DIMENSIONS: usize = 1536;
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Turns text into fixed-length vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimensions(&self) -> usize;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedding provider returned no vectors"))
    }
}

/// OpenAI `/v1/embeddings` client
pub struct OpenAiEmbedder {
    api_key: String,
    model: String,
    dimensions: usize,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: String, dimensions: usize) -> Self {
        Self {
            api_key,
            model,
            dimensions,
            base_url: OPENAI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        // Only the text-embedding-3 family accepts a dimensions override
        if self.model.starts_with("text-embedding-3") {
            request["dimensions"] = serde_json::Value::from(self.dimensions);
        }

        log::debug!("embedding {} texts with {}", texts.len(), self.model);
        let response = self
            .client
            .post(self.embeddings_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to reach embeddings endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Embeddings API error ({}): {}", status, error_text));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embeddings response")?;
        parsed.data.sort_by_key(|d| d.index);

        if parsed.data.len() != texts.len() {
            return Err(anyhow!(
                "Embeddings API returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            ));
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Offline embedder: hashes lowercase word tokens into a normalised bag-of-words vector.
///
/// Texts sharing words land close together under cosine similarity, which is
/// enough for in-memory runs without an embeddings API.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let slot = (hasher.finish() % self.dimensions as u64) as usize;
            vector[slot] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_hashing_embedder_similarity() {
        let embedder = HashingEmbedder::new(256);
        let vectors = embedder
            .embed(&[
                "gun control legislation".to_string(),
                "Gun legislation and control".to_string(),
                "healthcare insurance premiums".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(vectors[0].len(), 256);
        assert!(cosine(&vectors[0], &vectors[1]) > 0.99);
        assert!(cosine(&vectors[0], &vectors[2]) < 0.5);
    }

    #[test]
    fn test_hashing_embedder_empty_text_is_zero() {
        let embedder = HashingEmbedder::new(8);
        let vector = tokio_test::block_on(embedder.embed_one("")).unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));
    }
}
