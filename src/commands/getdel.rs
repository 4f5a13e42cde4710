use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Get the value of key and delete the key. This command is similar to GET, except for the fact
/// that it also deletes the key on success (if and only if the key's value type is a string).
///
/// Ref: <https://redis.io/docs/latest/commands/getdel/>
#[derive(Debug, PartialEq)]
pub struct Getdel {
    pub key: String,
}

impl Guarded for Getdel {
    const FAMILY: Family = Family::String;
}

impl Executable for Getdel {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        // The read and the removal happen under the same lock.
        match key.value() {
            Some(Value::String(data)) => {
                let data = data.clone();
                key.delete();
                Ok(Frame::Bulk(data))
            }
            Some(Value::List(_) | Value::Set(_)) => Err(ExecError::WrongType.into()),
            None => Ok(Frame::Null),
        }
    }
}

impl TryFrom<&mut CommandParser> for Getdel {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
