use crate::commands::executable::Executable;
use crate::commands::incrby::incr_by;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::Error;

/// Increments the number stored at key by one. If the key does not exist, it is set to 0 before
/// performing the operation. An error is returned if the key contains a value of the wrong type or
/// contains a string that can not be represented as integer. This operation is limited to 64 bit
/// signed integers.
///
/// Ref: <https://redis.io/docs/latest/commands/incr/>
#[derive(Debug, PartialEq)]
pub struct Incr {
    pub key: String,
}

impl Guarded for Incr {
    const FAMILY: Family = Family::Counter;
}

impl Executable for Incr {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let value = incr_by(&store, &self.key, 1)?;
        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for Incr {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use std::collections::HashSet;

    use super::*;
    use crate::commands::registry::Registry;
    use crate::commands::{Command, ExecError};
    use crate::value::Value;

    fn incr_frame() -> Frame {
        Frame::Array(vec![
            Frame::Bulk(Bytes::from("INCR")),
            Frame::Bulk(Bytes::from("key1")),
        ])
    }

    #[tokio::test]
    async fn existing_key() {
        let store = Store::new();

        let cmd = Registry::new().parse(incr_frame()).unwrap();

        assert_eq!(
            cmd,
            Command::Incr(Incr {
                key: "key1".to_string()
            })
        );

        store.lock("key1").set(Value::from("1"), None);

        let res = cmd.exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Integer(2));
        assert_eq!(store.lock("key1").value(), Some(&Value::from("2")));
    }

    #[tokio::test]
    async fn non_existing_key() {
        let store = Store::new();

        let cmd = Registry::new().parse(incr_frame()).unwrap();
        let res = cmd.exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Integer(1));
        assert_eq!(store.lock("key1").value(), Some(&Value::from("1")));
    }

    #[tokio::test]
    async fn at_max() {
        let store = Store::new();
        store
            .lock("key1")
            .set(Value::from("9223372036854775807"), None);

        let cmd = Registry::new().parse(incr_frame()).unwrap();
        let err = cmd.exec(store.clone()).unwrap_err();

        assert_eq!(err.downcast_ref::<ExecError>(), Some(&ExecError::Overflow));
        assert_eq!(
            store.lock("key1").value(),
            Some(&Value::from("9223372036854775807"))
        );
    }

    #[tokio::test]
    async fn wrong_type() {
        let store = Store::new();
        let set = Value::Set(HashSet::from([Bytes::from("bar")]));
        store.lock("key1").set(set.clone(), None);

        let cmd = Registry::new().parse(incr_frame()).unwrap();
        let err = cmd.exec(store.clone()).unwrap_err();

        assert_eq!(
            err.to_string(),
            "WRONGTYPE Operation against a key holding the wrong kind of value"
        );
        assert_eq!(store.lock("key1").value(), Some(&set));
    }
}
