use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::{Store, TimeToLive};
use crate::Error;

/// TTL returns the remaining time to live of a key that has a timeout. This introspection
/// capability allows a Redis client to check how many seconds a given key will continue to be part
/// of the dataset.
///
/// Returns -1 if the key exists but has no associated expire, and -2 if the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/ttl>
#[derive(Debug, PartialEq)]
pub struct Ttl {
    pub key: String,
}

impl Guarded for Ttl {
    const FAMILY: Family = Family::Keyspace;
}

impl Executable for Ttl {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let ttl = match store.lock(&self.key).ttl() {
            TimeToLive::NotFound => -2,
            TimeToLive::NoExpiry => -1,
            // Rounded to the closest second.
            TimeToLive::Remaining(ttl) => ((ttl.as_millis() + 500) / 1000) as i64,
        };

        Ok(Frame::Integer(ttl))
    }
}

impl TryFrom<&mut CommandParser> for Ttl {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
