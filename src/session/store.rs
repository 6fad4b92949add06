//! In-memory session history with expiry
//!
//! Records expire a fixed time after their last write. When the store is
//! full the session idle the longest is evicted. Per-session serialization
//! of read-modify-write sequences goes through [`SessionStore::lock`], a
//! striped set of async mutexes keyed by session id.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

use crate::core::Config;

/// Stored history of one session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session_id: String,
    /// Prior user messages, oldest first
    pub messages: Vec<String>,
    pub created_at: Instant,
    /// Drives expiry
    pub last_write: Instant,
    /// Drives capacity eviction
    pub last_access: Instant,
}

impl SessionRecord {
    fn new(session_id: &str, now: Instant) -> Self {
        Self {
            session_id: session_id.to_string(),
            messages: Vec::new(),
            created_at: now,
            last_write: now,
            last_access: now,
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.last_write) >= ttl
    }
}

/// Bounded, expiring store of per-session user messages
pub struct SessionStore {
    ttl: Duration,
    capacity: usize,
    records: StdMutex<HashMap<String, SessionRecord>>,
    stripes: Vec<Arc<Mutex<()>>>,
}

impl SessionStore {
    /// Create a store; `capacity` and `stripes` are clamped to at least one
    pub fn new(ttl: Duration, capacity: usize, stripes: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            records: StdMutex::new(HashMap::new()),
            stripes: (0..stripes.max(1)).map(|_| Arc::new(Mutex::new(()))).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session_ttl(),
            config.session.capacity,
            config.session.lock_stripes,
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, SessionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize work on `session_id`
    ///
    /// Sessions hashing to the same stripe share the lock.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let mut hasher = DefaultHasher::new();
        session_id.hash(&mut hasher);
        let stripe = (hasher.finish() % self.stripes.len() as u64) as usize;
        self.stripes[stripe].clone().lock_owned().await
    }

    /// Prior messages of a session; empty when absent or expired
    pub fn get(&self, session_id: &str) -> Vec<String> {
        let now = Instant::now();
        let mut records = self.records();

        let expired = match records.get(session_id) {
            Some(record) => record.is_expired(self.ttl, now),
            None => return Vec::new(),
        };
        if expired {
            records.remove(session_id);
            tracing::debug!(session_id, "session expired");
            return Vec::new();
        }

        records
            .get_mut(session_id)
            .map(|record| {
                record.last_access = now;
                record.messages.clone()
            })
            .unwrap_or_default()
    }

    /// Append a message, creating the session if needed
    pub fn append(&self, session_id: &str, message: impl Into<String>) {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut records = self.records();

        records.retain(|_, record| !record.is_expired(ttl, now));

        if !records.contains_key(session_id) && records.len() >= self.capacity {
            let oldest = records
                .values()
                .min_by_key(|record| record.last_access)
                .map(|record| record.session_id.clone());
            if let Some(oldest) = oldest {
                records.remove(&oldest);
                tracing::debug!(evicted = %oldest, "session store at capacity");
            }
        }

        let record = records
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord::new(session_id, now));
        record.messages.push(message.into());
        record.last_write = now;
        record.last_access = now;
    }

    /// Snapshot of a live record
    pub fn record(&self, session_id: &str) -> Option<SessionRecord> {
        let now = Instant::now();
        self.records()
            .get(session_id)
            .filter(|record| !record.is_expired(self.ttl, now))
            .cloned()
    }

    /// Drop every expired record, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| !record.is_expired(ttl, now));
        before - records.len()
    }

    /// Number of stored sessions, expired ones included until purged
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), 100, 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_append_then_get() {
        let store = SessionStore::default();
        assert!(store.get("s1").is_empty());

        store.append("s1", "weather for 30041");
        store.append("s1", "thanks");
        assert_eq!(store.get("s1"), vec!["weather for 30041", "thanks"]);
        assert!(store.get("s2").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_since_last_write() {
        let store = SessionStore::new(Duration::from_secs(3600), 100, 4);
        store.append("s1", "first");

        tokio::time::advance(Duration::from_secs(3000)).await;
        // reads do not extend the lifetime
        assert_eq!(store.get("s1").len(), 1);

        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(store.get("s1").is_empty());
        assert!(store.record("s1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_refreshes_expiry() {
        let store = SessionStore::new(Duration::from_secs(10), 100, 4);
        store.append("s1", "a");
        tokio::time::advance(Duration::from_secs(8)).await;
        store.append("s1", "b");
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.get("s1"), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_longest_idle() {
        let store = SessionStore::new(Duration::from_secs(3600), 2, 4);
        store.append("s1", "one");
        tokio::time::advance(Duration::from_secs(1)).await;
        store.append("s2", "two");
        tokio::time::advance(Duration::from_secs(1)).await;

        // touching s1 leaves s2 as the longest idle
        store.get("s1");
        tokio::time::advance(Duration::from_secs(1)).await;
        store.append("s3", "three");

        assert_eq!(store.len(), 2);
        assert!(store.get("s2").is_empty());
        assert_eq!(store.get("s1"), vec!["one"]);
        assert_eq!(store.get("s3"), vec!["three"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = SessionStore::new(Duration::from_secs(5), 10, 1);
        store.append("s1", "a");
        store.append("s2", "b");
        tokio::time::advance(Duration::from_secs(6)).await;
        store.append("s3", "c");
        assert_eq!(store.len(), 1);
        assert_eq!(store.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_lock_serializes_same_session() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60), 10, 8));
        let guard = store.lock("s1").await;

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let _guard = store.lock("s1").await;
                store.append("s1", "second");
            })
        };

        tokio::task::yield_now().await;
        store.append("s1", "first");
        drop(guard);
        contender.await.unwrap();

        assert_eq!(store.get("s1"), vec!["first", "second"]);
    }
}
