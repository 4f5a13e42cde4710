use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::Error;

/// Returns the string representation of the type of the value stored at `key`: `string`, `list`
/// or `set`. If the key does not exist, `none` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/type/>
#[derive(Debug, PartialEq)]
pub struct Type {
    pub key: String,
}

impl Guarded for Type {
    const FAMILY: Family = Family::Keyspace;
}

impl Executable for Type {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let type_ = store
            .lock(&self.key)
            .tag()
            .map_or_else(|| "none".to_string(), |tag| tag.to_string());

        Ok(Frame::Simple(type_))
    }
}

impl TryFrom<&mut CommandParser> for Type {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
