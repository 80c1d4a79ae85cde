//! Redis-backed `DedupStore` variant.
//!
//! Three logical keys, non-atomic SADD+HSET for `mark_para` (set membership
//! is the source of truth, the sim-hash hash is advisory), and per-call
//! failures logged and swallowed rather than propagated.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;

pub struct NetworkedStore {
    conn: ConnectionManager,
    doc_key: String,
    para_key: String,
    simhash_key: String,
}

impl NetworkedStore {
    pub async fn connect(
        host: &str,
        port: u16,
        db: i64,
        password: Option<&str>,
        doc_key: String,
        para_key: String,
        simhash_key: String,
    ) -> redis::RedisResult<Self> {
        let mut url = format!("redis://{host}:{port}/{db}");
        if let Some(pw) = password {
            url = format!("redis://:{pw}@{host}:{port}/{db}");
        }
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn, doc_key, para_key, simhash_key })
    }

    pub async fn is_doc_seen(&self, hash: &str) -> bool {
        let mut conn = self.conn.clone();
        match conn.sismember::<_, _, bool>(&self.doc_key, hash).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "dedup store: doc lookup failed");
                false
            }
        }
    }

    pub async fn mark_doc(&self, hash: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.sadd::<_, _, ()>(&self.doc_key, hash).await {
            tracing::error!(error = %e, "dedup store: doc write failed");
        }
    }

    pub async fn is_para_seen(&self, hash: &str) -> bool {
        let mut conn = self.conn.clone();
        match conn.sismember::<_, _, bool>(&self.para_key, hash).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "dedup store: paragraph lookup failed");
                false
            }
        }
    }

    pub async fn mark_para(&self, hash: &str, simhash: Option<u64>) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.sadd::<_, _, ()>(&self.para_key, hash).await {
            tracing::error!(error = %e, "dedup store: paragraph write failed");
            return;
        }
        if let Some(sh) = simhash {
            if let Err(e) = conn.hset::<_, _, _, ()>(&self.simhash_key, hash, sh.to_string()).await {
                tracing::error!(error = %e, "dedup store: simhash write failed");
            }
        }
    }

    pub async fn all_para_simhash(&self) -> HashMap<String, u64> {
        let mut conn = self.conn.clone();
        match conn.hgetall::<_, HashMap<String, String>>(&self.simhash_key).await {
            Ok(raw) => raw.into_iter().filter_map(|(k, v)| v.parse::<u64>().ok().map(|n| (k, n))).collect(),
            Err(e) => {
                tracing::error!(error = %e, "dedup store: simhash scan failed");
                HashMap::new()
            }
        }
    }

    pub async fn clear_all(&self) {
        let mut conn = self.conn.clone();
        let keys = [self.doc_key.clone(), self.para_key.clone(), self.simhash_key.clone()];
        if let Err(e) = conn.del::<_, ()>(&keys[..]).await {
            tracing::error!(error = %e, "dedup store: clear_all failed");
        } else {
            tracing::warn!("dedup store: all networked dedup data cleared");
        }
    }

    pub async fn stats(&self) -> (usize, usize, usize) {
        let mut conn = self.conn.clone();
        let doc_count: usize = conn.scard(&self.doc_key).await.unwrap_or(0);
        let para_count: usize = conn.scard(&self.para_key).await.unwrap_or(0);
        let simhash_count: usize = conn.hlen(&self.simhash_key).await.unwrap_or(0);
        (doc_count, para_count, simhash_count)
    }
}
