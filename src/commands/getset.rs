use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Atomically sets `key` to `value` and returns the old value stored at `key`. Returns an error
/// when `key` exists but does not hold a string value. Any previous time to live associated with
/// the key is discarded on successful operation.
///
/// Ref: <https://redis.io/docs/latest/commands/getset/>
#[derive(Debug, PartialEq)]
pub struct Getset {
    pub key: String,
    pub value: Bytes,
}

impl Guarded for Getset {
    const FAMILY: Family = Family::String;
}

impl Executable for Getset {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let res = match key.value() {
            Some(Value::String(data)) => Frame::Bulk(data.clone()),
            Some(Value::List(_) | Value::Set(_)) => return Err(ExecError::WrongType.into()),
            None => Frame::Null,
        };

        key.set(Value::String(self.value), None);

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Getset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, value })
    }
}
