//! Vector memory store interface and its HTTP implementation.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::MemoryError;
use crate::memory::embeddings::EmbeddingClient;

/// One ranked match from a vector query.
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub metadata: serde_json::Value,
}

/// External vector memory store: embedding generation plus a namespaced
/// nearest-neighbor index.
///
/// Dimensionality is a fixed configuration constant shared between writer
/// and reader; implementations must reject vectors of any other length.
#[async_trait]
pub trait VectorMemory: Send + Sync {
    /// Embed a text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError>;

    /// Query the `top_k` nearest records in one namespace.
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, MemoryError>;

    /// Append one record to a namespace.
    async fn upsert(
        &self,
        namespace: &str,
        id: &str,
        vector: &[f32],
        metadata: serde_json::Value,
    ) -> Result<(), MemoryError>;
}

/// Vector store speaking a Pinecone-style REST protocol, with embeddings
/// delegated to an `EmbeddingClient`.
pub struct HttpVectorIndex {
    embeddings: EmbeddingClient,
    client: reqwest::Client,
    index_url: String,
    api_key: SecretString,
}

impl HttpVectorIndex {
    pub fn new(
        embeddings: EmbeddingClient,
        client: reqwest::Client,
        index_url: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            embeddings,
            client,
            index_url: index_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.index_url)
    }
}

#[async_trait]
impl VectorMemory for HttpVectorIndex {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        self.embeddings.embed(text).await
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, MemoryError> {
        let body = serde_json::json!({
            "namespace": namespace,
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });

        let resp = self
            .client
            .post(self.endpoint("query"))
            .header("Api-Key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| MemoryError::QueryFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(MemoryError::QueryFailed {
                reason: format!("status {status}: {detail}"),
            });
        }

        let data: serde_json::Value = resp.json().await.map_err(|e| MemoryError::QueryFailed {
            reason: e.to_string(),
        })?;

        parse_matches(&data)
    }

    async fn upsert(
        &self,
        namespace: &str,
        id: &str,
        vector: &[f32],
        metadata: serde_json::Value,
    ) -> Result<(), MemoryError> {
        let body = serde_json::json!({
            "namespace": namespace,
            "vectors": [{
                "id": id,
                "values": vector,
                "metadata": metadata,
            }],
        });

        let resp = self
            .client
            .post(self.endpoint("vectors/upsert"))
            .header("Api-Key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| MemoryError::UpsertFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(MemoryError::UpsertFailed {
                reason: format!("status {status}: {detail}"),
            });
        }

        Ok(())
    }
}

/// Parse the matches array out of a query response.
///
/// Store versions differ on nesting: the array arrives either top-level as
/// `matches` or wrapped as `result.matches`. Both are accepted; callers
/// never see the discrepancy.
fn parse_matches(data: &serde_json::Value) -> Result<Vec<IndexMatch>, MemoryError> {
    let matches = data
        .get("matches")
        .or_else(|| data.pointer("/result/matches"))
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| MemoryError::MalformedResponse {
            reason: "missing matches array".to_string(),
        })?;

    Ok(matches
        .iter()
        .map(|m| IndexMatch {
            id: m
                .get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
            score: m
                .get("score")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(0.0) as f32,
            metadata: m.get("metadata").cloned().unwrap_or(serde_json::Value::Null),
        })
        .collect())
}
