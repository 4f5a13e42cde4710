use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Remove the specified members from the set stored at `key`. Members that are not in the set are
/// ignored. The key is removed with its last member.
///
/// Ref: <https://redis.io/docs/latest/commands/srem/>
#[derive(Debug, PartialEq)]
pub struct Srem {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Guarded for Srem {
    const FAMILY: Family = Family::Set;
}

impl Executable for Srem {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let removed = key.mutate(|value| match value {
            Value::Set(set) => Ok(self
                .members
                .iter()
                .filter(|member| set.remove(*member))
                .count()),
            Value::String(_) | Value::List(_) => Err(ExecError::WrongType),
        });

        let removed = removed.transpose()?.unwrap_or(0);
        Ok(Frame::Integer(removed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Srem {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.rest_bytes()?;

        Ok(Self { key, members })
    }
}
