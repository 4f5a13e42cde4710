use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Returns all the members of the set value stored at `key`, in no particular order.
///
/// Ref: <https://redis.io/docs/latest/commands/smembers/>
#[derive(Debug, PartialEq)]
pub struct Smembers {
    pub key: String,
}

impl Guarded for Smembers {
    const FAMILY: Family = Family::Set;
}

impl Executable for Smembers {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        match key.value() {
            Some(Value::Set(set)) => Ok(Frame::Array(
                set.iter().cloned().map(Frame::Bulk).collect(),
            )),
            Some(Value::String(_) | Value::List(_)) => Err(ExecError::WrongType.into()),
            None => Ok(Frame::Array(vec![])),
        }
    }
}

impl TryFrom<&mut CommandParser> for Smembers {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
