use crate::commands::executable::Executable;
use crate::commands::incrby::incr_by;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::Error;

/// Decrements the number stored at key by one.
///
/// Ref: <https://redis.io/docs/latest/commands/decr/>
#[derive(Debug, PartialEq)]
pub struct Decr {
    pub key: String,
}

impl Guarded for Decr {
    const FAMILY: Family = Family::Counter;
}

impl Executable for Decr {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let value = incr_by(&store, &self.key, -1)?;
        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for Decr {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
