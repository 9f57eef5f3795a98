//! At most one ingestion per `(userId, fileKey)` inside this process.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::debug;

type LeaseKey = (String, String);

#[derive(Debug, Clone, Default)]
pub struct LeaseRegistry {
    held: Arc<Mutex<HashSet<LeaseKey>>>,
}

/// Held while a file is being ingested; released on drop.
#[derive(Debug)]
pub struct FileLease {
    key: LeaseKey,
    held: Arc<Mutex<HashSet<LeaseKey>>>,
}

fn lock(m: &Mutex<HashSet<LeaseKey>>) -> MutexGuard<'_, HashSet<LeaseKey>> {
    // The set stays consistent even if a holder panicked.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when another run already holds the file.
    pub fn try_acquire(&self, user_id: &str, file_key: &str) -> Option<FileLease> {
        let key = (user_id.to_string(), file_key.to_string());
        if !lock(&self.held).insert(key.clone()) {
            return None;
        }
        debug!(target: "forge::lease", user_id, file_key, "lease acquired");
        Some(FileLease {
            key,
            held: self.held.clone(),
        })
    }

    pub fn is_held(&self, user_id: &str, file_key: &str) -> bool {
        lock(&self.held).contains(&(user_id.to_string(), file_key.to_string()))
    }
}

impl Drop for FileLease {
    fn drop(&mut self) {
        lock(&self.held).remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_drop() {
        let reg = LeaseRegistry::new();
        let lease = reg.try_acquire("u1", "k1").unwrap();
        assert!(reg.try_acquire("u1", "k1").is_none());
        assert!(reg.try_acquire("u2", "k1").is_some());
        drop(lease);
        assert!(!reg.is_held("u1", "k1"));
        assert!(reg.try_acquire("u1", "k1").is_some());
    }
}
