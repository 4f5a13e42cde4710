use crate::commands::bitcount::normalize;
use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Returns the specified elements of the list stored at `key`. The offsets `start` and `stop` are
/// zero-based indexes, inclusive, and can be negative numbers indicating offsets from the end of
/// the list.
///
/// Out of range indexes will not produce an error: they are clamped to the list bounds.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Debug, PartialEq)]
pub struct Lrange {
    pub key: String,
    pub start: i64,
    pub stop: i64,
}

impl Guarded for Lrange {
    const FAMILY: Family = Family::List;
}

impl Executable for Lrange {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let list = match key.value() {
            Some(Value::List(list)) => list,
            Some(Value::String(_) | Value::Set(_)) => return Err(ExecError::WrongType.into()),
            None => return Ok(Frame::Array(vec![])),
        };

        let elements = match normalize(self.start, self.stop, list.len() as i64) {
            Some((start, stop)) => list
                .range(start..=stop)
                .cloned()
                .map(Frame::Bulk)
                .collect(),
            None => vec![],
        };

        Ok(Frame::Array(elements))
    }
}

impl TryFrom<&mut CommandParser> for Lrange {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;

        Ok(Self { key, start, stop })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use std::collections::HashSet;

    use super::*;
    use crate::commands::registry::Registry;
    use crate::commands::Command;

    fn lrange(store: &Store, start: &'static str, stop: &'static str) -> Result<Frame, Error> {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LRANGE")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from(start)),
            Frame::Bulk(Bytes::from(stop)),
        ]);

        Registry::new().parse(frame)?.exec(store.clone())
    }

    fn bulks(items: &[&'static str]) -> Frame {
        Frame::Array(items.iter().map(|i| Frame::Bulk(Bytes::from(*i))).collect())
    }

    #[tokio::test]
    async fn ranges() {
        let store = Store::new();
        store.lock("key1").set(
            Value::List(["one", "two", "three"].map(Bytes::from).into()),
            None,
        );

        assert_eq!(lrange(&store, "0", "0").unwrap(), bulks(&["one"]));
        assert_eq!(
            lrange(&store, "-3", "2").unwrap(),
            bulks(&["one", "two", "three"])
        );
        assert_eq!(
            lrange(&store, "-100", "100").unwrap(),
            bulks(&["one", "two", "three"])
        );
        assert_eq!(lrange(&store, "1", "-1").unwrap(), bulks(&["two", "three"]));
        assert_eq!(lrange(&store, "5", "10").unwrap(), bulks(&[]));
        assert_eq!(lrange(&store, "2", "1").unwrap(), bulks(&[]));
    }

    #[tokio::test]
    async fn missing_key() {
        let store = Store::new();

        assert_eq!(lrange(&store, "0", "-1").unwrap(), Frame::Array(vec![]));
    }

    #[tokio::test]
    async fn wrong_type() {
        let store = Store::new();
        let set = Value::Set(HashSet::from([Bytes::from("bar")]));
        store.lock("key1").set(set, None);

        let err = lrange(&store, "0", "-1").unwrap_err();

        assert_eq!(
            err.downcast_ref::<ExecError>(),
            Some(&ExecError::WrongType)
        );
    }

    #[test]
    fn parse() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LRANGE")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Integer(0),
            Frame::Integer(-1),
        ]);

        assert_eq!(
            Registry::new().parse(frame).unwrap(),
            Command::Lrange(Lrange {
                key: String::from("key1"),
                start: 0,
                stop: -1,
            })
        );
    }
}
