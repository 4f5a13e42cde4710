use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Returns the length of the list stored at `key`. If `key` does not exist, it is interpreted as
/// an empty list and 0 is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/llen/>
#[derive(Debug, PartialEq)]
pub struct Llen {
    pub key: String,
}

impl Guarded for Llen {
    const FAMILY: Family = Family::List;
}

impl Executable for Llen {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        match key.value() {
            Some(Value::List(list)) => Ok(Frame::Integer(list.len() as i64)),
            Some(Value::String(_) | Value::Set(_)) => Err(ExecError::WrongType.into()),
            None => Ok(Frame::Integer(0)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Llen {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::commands::registry::Registry;

    fn llen_frame() -> Frame {
        Frame::Array(vec![
            Frame::Bulk(Bytes::from("LLEN")),
            Frame::Bulk(Bytes::from("key1")),
        ])
    }

    #[tokio::test]
    async fn existing_and_missing_keys() {
        let store = Store::new();
        let registry = Registry::new();

        let res = registry.parse(llen_frame()).unwrap().exec(store.clone());
        assert_eq!(res.unwrap(), Frame::Integer(0));

        store.lock("key1").set(
            Value::List([Bytes::from("a"), Bytes::from("b")].into()),
            None,
        );

        let res = registry.parse(llen_frame()).unwrap().exec(store.clone());
        assert_eq!(res.unwrap(), Frame::Integer(2));
    }

    #[tokio::test]
    async fn wrong_type() {
        let store = Store::new();
        store.lock("key1").set(Value::from("a"), None);

        let cmd = Registry::new().parse(llen_frame()).unwrap();
        let err = cmd.exec(store.clone()).unwrap_err();

        assert_eq!(
            err.downcast_ref::<ExecError>(),
            Some(&ExecError::WrongType)
        );
    }
}
