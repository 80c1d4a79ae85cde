//! Process-lifetime `task_id -> task state` map.
//!
//! `dashmap` backs the concurrent
//! registry; reused here unchanged for the same reason — lock-free reads
//! once a task's entry settles, serialised writes per key while a task is
//! still processing.

use crate::types::{StatusSnapshot, TaskStatus};
use dashmap::DashMap;

pub struct JobRegistry {
    tasks: DashMap<String, StatusSnapshot>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { tasks: DashMap::new() }
    }

    pub fn insert(&self, snapshot: StatusSnapshot) {
        self.tasks.insert(snapshot.task_id.clone(), snapshot);
    }

    pub fn get(&self, task_id: &str) -> Option<StatusSnapshot> {
        self.tasks.get(task_id).map(|entry| entry.clone())
    }

    /// Applies `update` to the task's snapshot under the shard's lock,
    /// serialising concurrent Phase-B workers writing to the same task.
    pub fn update<F>(&self, task_id: &str, update: F)
    where
        F: FnOnce(&mut StatusSnapshot),
    {
        if let Some(mut entry) = self.tasks.get_mut(task_id) {
            update(&mut entry);
        }
    }

    pub fn set_status(&self, task_id: &str, status: TaskStatus) {
        self.update(task_id, |snapshot| snapshot.status = status);
    }

    pub fn remove(&self, task_id: &str) -> Option<StatusSnapshot> {
        self.tasks.remove(task_id).map(|(_, snapshot)| snapshot)
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|entry| entry.key().clone()).collect()
    }
}
