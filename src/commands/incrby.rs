use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{parse_integer, CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Increments the number stored at key by `increment`.
///
/// Ref: <https://redis.io/docs/latest/commands/incrby/>
#[derive(Debug, PartialEq)]
pub struct IncrBy {
    pub key: String,
    pub increment: i64,
}

impl Guarded for IncrBy {
    const FAMILY: Family = Family::Counter;
}

impl Executable for IncrBy {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let value = incr_by(&store, &self.key, self.increment)?;
        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for IncrBy {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let increment = parser.next_integer()?;

        Ok(Self { key, increment })
    }
}

/// Adds `delta` to the counter stored at `key`, creating it at zero if absent, and returns the new
/// value. The key keeps its expiration. Nothing is written when the stored string is not a valid
/// integer or the result overflows.
pub(crate) fn incr_by(store: &Store, key: &str, delta: i64) -> Result<i64, ExecError> {
    let mut key = store.lock(key);
    key.guard(Family::Counter)?;

    let (current, expires_at) = match key.get() {
        Some(entry) => match &entry.value {
            Value::String(data) => (
                parse_integer(data).ok_or(ExecError::NotInteger)?,
                entry.expires_at,
            ),
            Value::List(_) | Value::Set(_) => return Err(ExecError::WrongType),
        },
        None => (0, None),
    };

    let value = current.checked_add(delta).ok_or(ExecError::Overflow)?;
    key.set(Value::String(Bytes::from(value.to_string())), expires_at);

    Ok(value)
}
