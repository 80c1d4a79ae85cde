use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Non-durable backend: three containers behind one mutex, exactly mirroring
/// the networked backend's logical keys (`doc:hashes`, `para:hashes`, `para:simhash`)
/// so the two backends are behaviourally interchangeable.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    doc_hashes: HashSet<String>,
    para_hashes: HashSet<String>,
    para_simhash: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_doc_seen(&self, hash: &str) -> bool {
        self.inner.lock().doc_hashes.contains(hash)
    }

    pub fn mark_doc(&self, hash: &str) {
        self.inner.lock().doc_hashes.insert(hash.to_string());
    }

    pub fn is_para_seen(&self, hash: &str) -> bool {
        self.inner.lock().para_hashes.contains(hash)
    }

    /// Mirrors the non-atomic SADD+HSET sequence of the networked backend: set
    /// membership and the sim-hash map are updated together under one lock, so
    /// in-memory they are in fact atomic, but callers must not assume the
    /// networked backend offers the same guarantee (see `NetworkedStore`).
    pub fn mark_para(&self, hash: &str, simhash: Option<u64>) {
        let mut inner = self.inner.lock();
        inner.para_hashes.insert(hash.to_string());
        if let Some(sh) = simhash {
            inner.para_simhash.insert(hash.to_string(), sh);
        }
    }

    pub fn all_para_simhash(&self) -> HashMap<String, u64> {
        self.inner.lock().para_simhash.clone()
    }

    pub fn clear_all(&self) {
        let mut inner = self.inner.lock();
        inner.doc_hashes.clear();
        inner.para_hashes.clear();
        inner.para_simhash.clear();
    }

    pub fn stats(&self) -> (usize, usize, usize) {
        let inner = self.inner.lock();
        (inner.doc_hashes.len(), inner.para_hashes.len(), inner.para_simhash.len())
    }
}
