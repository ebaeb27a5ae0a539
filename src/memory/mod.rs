//! Per-sender memory: embeddings, vector index, and the gateway.

pub mod embeddings;
pub mod gateway;
pub mod index;

pub use embeddings::EmbeddingClient;
pub use gateway::{MemoryGateway, UNKNOWN_NAMESPACE, derive_namespace};
pub use index::{HttpVectorIndex, IndexMatch, VectorMemory};
