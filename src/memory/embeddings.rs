//! Embedding generation via an OpenAI-compatible embeddings endpoint.

use secrecy::{ExposeSecret, SecretString};

use crate::error::MemoryError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP client for the embeddings endpoint.
///
/// Validates every response against the configured dimensionality — the
/// index was created with a fixed dimension and a mismatched write would
/// poison the namespace.
pub struct EmbeddingClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    dimension: usize,
    base_url: String,
}

impl EmbeddingClient {
    pub fn new(
        client: reqwest::Client,
        api_key: SecretString,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            api_key,
            model: model.into(),
            dimension,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a non-default embeddings endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Configured vector length.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed a single text into a fixed-length vector.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let resp = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| MemoryError::EmbeddingFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(MemoryError::EmbeddingFailed {
                reason: format!("status {status}: {detail}"),
            });
        }

        let data: serde_json::Value =
            resp.json().await.map_err(|e| MemoryError::EmbeddingFailed {
                reason: e.to_string(),
            })?;

        let vector = parse_embedding(&data)?;

        if vector.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

/// Extract `data[0].embedding` from an embeddings response.
fn parse_embedding(data: &serde_json::Value) -> Result<Vec<f32>, MemoryError> {
    let values = data
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(|e| e.get("embedding"))
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| MemoryError::MalformedResponse {
            reason: "missing data[0].embedding".to_string(),
        })?;

    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| MemoryError::MalformedResponse {
                    reason: "non-numeric embedding component".to_string(),
                })
        })
        .collect()
}
