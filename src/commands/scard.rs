use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Returns the set cardinality (number of elements) of the set stored at `key`, or 0 if the key
/// does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/scard/>
#[derive(Debug, PartialEq)]
pub struct Scard {
    pub key: String,
}

impl Guarded for Scard {
    const FAMILY: Family = Family::Set;
}

impl Executable for Scard {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        match key.value() {
            Some(Value::Set(set)) => Ok(Frame::Integer(set.len() as i64)),
            Some(Value::String(_) | Value::List(_)) => Err(ExecError::WrongType.into()),
            None => Ok(Frame::Integer(0)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Scard {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
