use crate::commands::executable::Executable;
use crate::commands::incrby::incr_by;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::Error;

/// Decrements the number stored at key by `decrement`.
///
/// Ref: <https://redis.io/docs/latest/commands/decrby/>
#[derive(Debug, PartialEq)]
pub struct DecrBy {
    pub key: String,
    pub decrement: i64,
}

impl Guarded for DecrBy {
    const FAMILY: Family = Family::Counter;
}

impl Executable for DecrBy {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        // i64::MIN has no positive counterpart.
        let delta = self.decrement.checked_neg().ok_or(ExecError::Overflow)?;
        let value = incr_by(&store, &self.key, delta)?;

        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for DecrBy {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let decrement = parser.next_integer()?;

        Ok(Self { key, decrement })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::commands::registry::Registry;
    use crate::commands::Command;
    use crate::value::Value;

    fn decrby_frame(decrement: &'static str) -> Frame {
        Frame::Array(vec![
            Frame::Bulk(Bytes::from("DECRBY")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from(decrement)),
        ])
    }

    #[tokio::test]
    async fn existing_key() {
        let store = Store::new();

        let cmd = Registry::new().parse(decrby_frame("10")).unwrap();

        assert_eq!(
            cmd,
            Command::DecrBy(DecrBy {
                key: "key1".to_string(),
                decrement: 10,
            })
        );

        store.lock("key1").set(Value::from("20"), None);

        let res = cmd.exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Integer(10));
        assert_eq!(store.lock("key1").value(), Some(&Value::from("10")));
    }

    #[tokio::test]
    async fn non_existing_key() {
        let store = Store::new();

        let cmd = Registry::new().parse(decrby_frame("10")).unwrap();
        let res = cmd.exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Integer(-10));
    }

    #[tokio::test]
    async fn negating_min_overflows() {
        let store = Store::new();
        store.lock("key1").set(Value::from("0"), None);

        let cmd = Registry::new()
            .parse(decrby_frame("-9223372036854775808"))
            .unwrap();
        let err = cmd.exec(store.clone()).unwrap_err();

        assert_eq!(err.downcast_ref::<ExecError>(), Some(&ExecError::Overflow));
        assert_eq!(store.lock("key1").value(), Some(&Value::from("0")));
    }

    #[test]
    fn invalid_decrement() {
        let err = Registry::new().parse(decrby_frame("ten")).err().unwrap();

        assert_eq!(err.to_string(), "ERR value is not an integer or out of range");
    }
}
