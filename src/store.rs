use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::Notify;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::trace;

use crate::commands::ExecError;
use crate::guard::{self, Family};
use crate::value::{Entry, Tag, Value};

pub const DEFAULT_SHARDS: usize = 16;

/// The Store is responsible for managing keys and their typed values, with optional time-to-live
/// settings for each key.
///
/// Keys are partitioned into shards, each behind its own lock, so commands on different keys run
/// in parallel while commands on the same key are serialized. Expired keys behave as absent to
/// every reader and are removed on first access. A background task reclaims the ones nobody
/// touches.
///
/// The store is cheap to clone: clones share the same shards.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    /// Creates a store with [`DEFAULT_SHARDS`] shards. Must be called within a Tokio runtime.
    pub fn new() -> Store {
        Store::with_shards(DEFAULT_SHARDS)
    }

    pub fn with_shards(shards: usize) -> Store {
        let shards = (0..shards.max(1))
            .map(|_| {
                Mutex::new(State {
                    keys: HashMap::new(),
                    ttls: BTreeSet::new(),
                })
            })
            .collect();

        let waker = Arc::new(Notify::new());
        let inner = Arc::new(InnerStore {
            shards,
            waker: waker.clone(),
        });

        tokio::spawn({
            let inner = Arc::downgrade(&inner);
            async move { remove_expired_keys(inner, waker).await }
        });

        Self { inner }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct InnerStore {
    shards: Vec<Mutex<State>>,
    waker: Arc<Notify>,
}

impl InnerStore {
    /// Locks the shard owning `key`. Everything done through the returned handle happens
    /// atomically with respect to other commands on the same key.
    pub fn lock<'a>(&'a self, key: &'a str) -> LockedKey<'a> {
        let state = self.shards[self.shard_index(key)]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        LockedKey {
            state,
            waker: &self.waker,
            key,
        }
    }

    /// Number of live keys. Shards are visited one at a time, so under concurrent writes the
    /// result is only an approximation.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .keys
                    .values()
                    .filter(|entry| !entry.is_expired(now))
                    .count()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Removes every expired key and returns the next deadline across all shards, if any.
    pub fn remove_expired_keys(&self) -> Option<Instant> {
        let now = Instant::now();

        self.shards
            .iter()
            .filter_map(|shard| {
                let mut state = shard.lock().unwrap_or_else(PoisonError::into_inner);
                state.remove_expired_keys(now)
            })
            .min()
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }
}

impl Drop for InnerStore {
    fn drop(&mut self) {
        // Let the reclaimer notice the store is gone.
        self.waker.notify_one();
    }
}

type Key = String;

struct State {
    keys: HashMap<Key, Entry>,
    ttls: BTreeSet<(Instant, Key)>,
}

impl State {
    fn remove_expired_keys(&mut self, now: Instant) -> Option<Instant> {
        let expired: Vec<(Instant, Key)> = self
            .ttls
            .iter()
            .take_while(|(expires_at, _)| expires_at <= &now)
            .cloned()
            .collect();

        for (when, key) in expired {
            trace!(key = %key, "reclaiming expired key");
            self.keys.remove(&key);
            self.ttls.remove(&(when, key));
        }

        self.ttls.iter().next().map(|&(expires_at, _)| expires_at)
    }

    fn untrack(&mut self, key: &str, entry: &Entry) {
        if let Some(expires_at) = entry.expires_at {
            self.ttls.remove(&(expires_at, key.to_string()));
        }
    }
}

/// Remaining time to live of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeToLive {
    NotFound,
    NoExpiry,
    Remaining(Duration),
}

/// Exclusive access to a single key, holding the lock of the shard that owns it.
///
/// Every accessor first checks whether the key has expired and, if so, removes it. A read can
/// therefore mutate the store: that is how lazy expiry is enforced.
pub struct LockedKey<'a> {
    state: MutexGuard<'a, State>,
    waker: &'a Notify,
    key: &'a str,
}

impl<'a> LockedKey<'a> {
    pub fn key(&self) -> &str {
        self.key
    }

    pub fn get(&mut self) -> Option<&Entry> {
        self.purge_expired();
        self.state.keys.get(self.key)
    }

    pub fn get_mut(&mut self) -> Option<&mut Entry> {
        self.purge_expired();
        self.state.keys.get_mut(self.key)
    }

    pub fn value(&mut self) -> Option<&Value> {
        self.get().map(|entry| &entry.value)
    }

    pub fn tag(&mut self) -> Option<Tag> {
        self.get().map(Entry::tag)
    }

    pub fn exists(&mut self) -> bool {
        self.get().is_some()
    }

    /// Rejects the command if the key holds a value of a type outside `family`. Absent keys
    /// always pass.
    pub fn guard(&mut self, family: Family) -> Result<(), ExecError> {
        let tag = self.tag();
        guard::check(family, tag)
    }

    /// Stores `value` regardless of what the key held before, replacing its expiration.
    pub fn set(&mut self, value: Value, expires_at: Option<Instant>) {
        let key = self.key.to_string();
        let entry = Entry::new(value, expires_at);

        if let Some(previous) = self.state.keys.insert(key.clone(), entry) {
            self.state.untrack(self.key, &previous);
        }

        if let Some(expires_at) = expires_at {
            self.track(expires_at, key);
        }
    }

    /// Removes the key, returning its entry if it was live.
    pub fn remove(&mut self) -> Option<Entry> {
        self.purge_expired();
        let entry = self.state.keys.remove(self.key)?;
        self.state.untrack(self.key, &entry);
        Some(entry)
    }

    /// Removes the key. Expired keys count as absent.
    pub fn delete(&mut self) -> bool {
        self.remove().is_some()
    }

    /// Applies `f` to the live value in place. The key is dropped if `f` leaves an empty
    /// collection behind.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut Value) -> R) -> Option<R> {
        let entry = self.get_mut()?;
        let res = f(&mut entry.value);

        if entry.value.is_empty_collection() {
            self.remove();
        }

        Some(res)
    }

    /// Replaces the expiration of a live key. Returns whether the key exists.
    pub fn set_expiry(&mut self, expires_at: Option<Instant>) -> bool {
        let Some(entry) = self.get_mut() else {
            return false;
        };
        let previous = std::mem::replace(&mut entry.expires_at, expires_at);

        if let Some(previous) = previous {
            self.state.ttls.remove(&(previous, self.key.to_string()));
        }
        if let Some(expires_at) = expires_at {
            self.track(expires_at, self.key.to_string());
        }

        true
    }

    pub fn ttl(&mut self) -> TimeToLive {
        let now = Instant::now();
        match self.get() {
            None => TimeToLive::NotFound,
            Some(Entry {
                expires_at: None, ..
            }) => TimeToLive::NoExpiry,
            Some(Entry {
                expires_at: Some(expires_at),
                ..
            }) => TimeToLive::Remaining(expires_at.saturating_duration_since(now)),
        }
    }

    fn track(&mut self, expires_at: Instant, key: Key) {
        self.state.ttls.insert((expires_at, key));

        let expires_next = self
            .state
            .ttls
            .iter()
            .next()
            .is_some_and(|&(next, _)| next == expires_at);
        if expires_next {
            self.waker.notify_one();
        }
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        let expired = self
            .state
            .keys
            .get(self.key)
            .is_some_and(|entry| entry.is_expired(now));

        if expired {
            trace!(key = self.key, "removing expired key on access");
            if let Some(entry) = self.state.keys.remove(self.key) {
                self.state.untrack(self.key, &entry);
            }
        }
    }
}

async fn remove_expired_keys(store: Weak<InnerStore>, waker: Arc<Notify>) {
    loop {
        let next_expiration = match store.upgrade() {
            Some(store) => store.remove_expired_keys(),
            None => break,
        };

        if let Some(next_expiration) = next_expiration {
            tokio::select! {
                _ = sleep_until(next_expiration) => {}
                _ = waker.notified() => {}
            }
        } else {
            waker.notified().await;
        }
    }

    trace!("store dropped, expired key reclaimer stopped");
}
