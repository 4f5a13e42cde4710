use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::Error;

/// Removes the specified keys, whatever type of value they hold. A key is ignored if it does not
/// exist.
///
/// Ref: <https://redis.io/docs/latest/commands/del/>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<String>,
}

impl Guarded for Del {
    const FAMILY: Family = Family::Keyspace;
}

impl Executable for Del {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut count = 0;

        for key in &self.keys {
            let mut key = store.lock(key);
            key.guard(Self::FAMILY)?;

            if key.delete() {
                count += 1;
            }
        }

        Ok(Frame::Integer(count))
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        Ok(Self { keys })
    }
}
