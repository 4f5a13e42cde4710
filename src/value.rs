use bytes::Bytes;
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use strum_macros::{AsRefStr, Display, EnumIter};
use tokio::time::Instant;

/// The fixed type classification of a stored value. A key's tag never changes while the key is
/// live: it can only be deleted and recreated with a different one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Tag {
    String,
    List,
    Set,
}

/// A stored value. Counters and bitmaps are plain strings, interpreted by the commands that
/// operate on them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::String(_) => Tag::String,
            Value::List(_) => Tag::List,
            Value::Set(_) => Tag::Set,
        }
    }

    /// Empty collections are indistinguishable from absent keys, so the store drops them. An
    /// empty string is a real value.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
        }
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::String(data)
    }
}

impl From<&'static str> for Value {
    fn from(data: &'static str) -> Self {
        Value::String(Bytes::from(data))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: Value,
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(value: Value, expires_at: Option<Instant>) -> Entry {
        Entry { value, expires_at }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn tag(&self) -> Tag {
        self.value.tag()
    }
}

/// An expiration as written by clients: relative (`EX`, `PX`) or an absolute Unix time (`EXAT`,
/// `PXAT`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expiry {
    Ex(u64),
    Px(u64),
    ExAt(u64),
    PxAt(u64),
}

impl Expiry {
    /// Resolves the expiration to a monotonic deadline. Absolute times that already passed resolve
    /// to `now`, which makes the entry expired on its next access. Returns `None` if the deadline
    /// can't be represented.
    pub fn deadline(&self, now: Instant) -> Option<Instant> {
        match *self {
            Expiry::Ex(seconds) => now.checked_add(Duration::from_secs(seconds)),
            Expiry::Px(millis) => now.checked_add(Duration::from_millis(millis)),
            Expiry::ExAt(seconds) => {
                let at = UNIX_EPOCH.checked_add(Duration::from_secs(seconds))?;
                Some(instant_from_system_time(now, at))
            }
            Expiry::PxAt(millis) => {
                let at = UNIX_EPOCH.checked_add(Duration::from_millis(millis))?;
                Some(instant_from_system_time(now, at))
            }
        }
    }

    /// The raw amount supplied by the client. Redis rejects zero for every form.
    pub fn amount(&self) -> u64 {
        match *self {
            Expiry::Ex(n) | Expiry::Px(n) | Expiry::ExAt(n) | Expiry::PxAt(n) => n,
        }
    }
}

/// Milliseconds since the Unix epoch on the wall clock.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

fn instant_from_system_time(now: Instant, at: SystemTime) -> Instant {
    match at.duration_since(SystemTime::now()) {
        Ok(remaining) => now.checked_add(remaining).unwrap_or(now),
        Err(_) => now,
    }
}
