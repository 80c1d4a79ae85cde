//! Cross-task deduplication store: document fingerprints, paragraph hashes,
//! and paragraph sim-hashes, shared by every batch.
//!
//! Tagged-variant dispatch rather than a trait object, since there are
//! exactly two backends and no plugin requirement.

mod hash;
mod memory;
#[cfg(feature = "redis-store")]
mod networked;

pub use hash::{sha256_bytes, sha256_text};
use memory::MemoryStore;
#[cfg(feature = "redis-store")]
use networked::NetworkedStore;

use crate::config::PipelineConfig;
use crate::types::DedupStats;
use std::collections::HashMap;

pub enum DedupStore {
    Memory(MemoryStore),
    #[cfg(feature = "redis-store")]
    Networked(NetworkedStore),
}

impl DedupStore {
    /// Attempts a Redis connection when `redis_enabled`; on any failure
    /// degrades to the in-memory backend with a warning rather than failing
    /// the whole pipeline over an optional cache.
    pub async fn from_config(config: &PipelineConfig) -> Self {
        if config.redis_enabled {
            #[cfg(feature = "redis-store")]
            {
                match NetworkedStore::connect(
                    &config.redis_host,
                    config.redis_port,
                    config.redis_db,
                    config.redis_password.as_deref(),
                    config.redis_doc_hashes_key.clone(),
                    config.redis_para_hashes_key.clone(),
                    config.redis_para_simhash_key.clone(),
                )
                .await
                {
                    Ok(store) => {
                        tracing::info!(host = %config.redis_host, port = config.redis_port, "dedup store: connected to redis");
                        return DedupStore::Networked(store);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "dedup store: redis connection failed, falling back to in-memory store");
                    }
                }
            }
            #[cfg(not(feature = "redis-store"))]
            {
                tracing::warn!("dedup store: redis_enabled but redis-store feature not compiled in, falling back to in-memory store");
            }
        }
        DedupStore::Memory(MemoryStore::new())
    }

    pub fn memory() -> Self {
        DedupStore::Memory(MemoryStore::new())
    }

    pub async fn is_doc_seen(&self, hash: &str) -> bool {
        match self {
            DedupStore::Memory(m) => m.is_doc_seen(hash),
            #[cfg(feature = "redis-store")]
            DedupStore::Networked(n) => n.is_doc_seen(hash).await,
        }
    }

    pub async fn mark_doc(&self, hash: &str) {
        match self {
            DedupStore::Memory(m) => m.mark_doc(hash),
            #[cfg(feature = "redis-store")]
            DedupStore::Networked(n) => n.mark_doc(hash).await,
        }
    }

    pub async fn is_para_seen(&self, hash: &str) -> bool {
        match self {
            DedupStore::Memory(m) => m.is_para_seen(hash),
            #[cfg(feature = "redis-store")]
            DedupStore::Networked(n) => n.is_para_seen(hash).await,
        }
    }

    pub async fn mark_para(&self, hash: &str, simhash: Option<u64>) {
        match self {
            DedupStore::Memory(m) => m.mark_para(hash, simhash),
            #[cfg(feature = "redis-store")]
            DedupStore::Networked(n) => n.mark_para(hash, simhash).await,
        }
    }

    pub async fn all_para_simhash(&self) -> HashMap<String, u64> {
        match self {
            DedupStore::Memory(m) => m.all_para_simhash(),
            #[cfg(feature = "redis-store")]
            DedupStore::Networked(n) => n.all_para_simhash().await,
        }
    }

    pub async fn clear_all(&self) {
        match self {
            DedupStore::Memory(m) => m.clear_all(),
            #[cfg(feature = "redis-store")]
            DedupStore::Networked(n) => n.clear_all().await,
        }
    }

    pub async fn stats(&self) -> DedupStats {
        let (doc_duplicates, para_exact_dup_total, _simhash_count) = match self {
            DedupStore::Memory(m) => m.stats(),
            #[cfg(feature = "redis-store")]
            DedupStore::Networked(n) => n.stats().await,
        };
        DedupStats {
            doc_duplicates,
            para_exact_dup_total,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_memory_when_redis_disabled() {
        let config = PipelineConfig::default();
        let store = DedupStore::from_config(&config).await;
        assert!(matches!(store, DedupStore::Memory(_)));
        store.mark_doc("abc").await;
        assert!(store.is_doc_seen("abc").await);
    }

    #[tokio::test]
    async fn memory_backend_round_trips_paragraph_simhash() {
        let store = DedupStore::memory();
        store.mark_para("p1", Some(7)).await;
        assert!(store.is_para_seen("p1").await);
        assert_eq!(store.all_para_simhash().await.get("p1"), Some(&7));
    }
}
