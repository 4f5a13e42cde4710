use bytes::Bytes;
use std::collections::VecDeque;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::{Entry, Value};
use crate::Error;

/// Insert all the specified values at the head of the list stored at `key`. If `key` does not
/// exist, it is created as an empty list before performing the push operation.
///
/// Elements are inserted one after the other, so `LPUSH mylist a b c` leaves `c` as the first
/// element and `a` as the last one.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub elements: Vec<Bytes>,
}

/// Insert all the specified values at the tail of the list stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub elements: Vec<Bytes>,
}

#[derive(Debug, Clone, Copy)]
enum End {
    Head,
    Tail,
}

impl Guarded for Lpush {
    const FAMILY: Family = Family::List;
}

impl Guarded for Rpush {
    const FAMILY: Family = Family::List;
}

impl Executable for Lpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        push(&store, &self.key, self.elements, End::Head)
    }
}

impl Executable for Rpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        push(&store, &self.key, self.elements, End::Tail)
    }
}

fn push(store: &Store, key: &str, elements: Vec<Bytes>, end: End) -> Result<Frame, Error> {
    let mut key = store.lock(key);
    key.guard(Family::List)?;

    let len = match key.get_mut() {
        Some(Entry {
            value: Value::List(list),
            ..
        }) => {
            extend(list, elements, end);
            list.len()
        }
        Some(_) => return Err(ExecError::WrongType.into()),
        None => {
            let mut list = VecDeque::with_capacity(elements.len());
            extend(&mut list, elements, end);

            let len = list.len();
            key.set(Value::List(list), None);
            len
        }
    };

    Ok(Frame::Integer(len as i64))
}

fn extend(list: &mut VecDeque<Bytes>, elements: Vec<Bytes>, end: End) {
    for element in elements {
        match end {
            End::Head => list.push_front(element),
            End::Tail => list.push_back(element),
        }
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let elements = parser.rest_bytes()?;

        Ok(Self { key, elements })
    }
}

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let elements = parser.rest_bytes()?;

        Ok(Self { key, elements })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use tokio::time::{Duration, Instant};

    use super::*;
    use crate::commands::registry::Registry;
    use crate::commands::Command;
    use crate::value::Tag;

    fn frame(parts: &[&'static str]) -> Frame {
        Frame::Array(parts.iter().map(|p| Frame::Bulk(Bytes::from(*p))).collect())
    }

    fn list(items: &[&'static str]) -> Value {
        Value::List(items.iter().map(|i| Bytes::from(*i)).collect())
    }

    #[tokio::test]
    async fn lpush_reverses_the_arguments() {
        let store = Store::new();

        let cmd = Registry::new()
            .parse(frame(&["LPUSH", "key1", "a", "b", "c"]))
            .unwrap();
        assert_eq!(
            cmd,
            Command::Lpush(Lpush {
                key: String::from("key1"),
                elements: vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")],
            })
        );

        assert_eq!(cmd.exec(store.clone()).unwrap(), Frame::Integer(3));
        assert_eq!(store.lock("key1").value(), Some(&list(&["c", "b", "a"])));
        assert_eq!(store.lock("key1").tag(), Some(Tag::List));
    }

    #[tokio::test]
    async fn rpush_appends() {
        let store = Store::new();
        store.lock("key1").set(list(&["a"]), None);

        let cmd = Registry::new()
            .parse(frame(&["RPUSH", "key1", "b", "c"]))
            .unwrap();

        assert_eq!(cmd.exec(store.clone()).unwrap(), Frame::Integer(3));
        assert_eq!(store.lock("key1").value(), Some(&list(&["a", "b", "c"])));
    }

    #[tokio::test]
    async fn keeps_expiration() {
        let store = Store::new();
        let expires_at = Instant::now() + Duration::from_secs(60);
        store.lock("key1").set(list(&["a"]), Some(expires_at));

        let cmd = Registry::new()
            .parse(frame(&["LPUSH", "key1", "b"]))
            .unwrap();
        cmd.exec(store.clone()).unwrap();

        assert_eq!(store.lock("key1").get().unwrap().expires_at, Some(expires_at));
    }

    #[tokio::test]
    async fn wrong_type() {
        let store = Store::new();
        let set = Value::Set(HashSet::from([Bytes::from("bar")]));
        store.lock("key1").set(set.clone(), None);

        for name in ["LPUSH", "RPUSH"] {
            let cmd = Registry::new().parse(frame(&[name, "key1", "a"])).unwrap();
            let err = cmd.exec(store.clone()).unwrap_err();

            assert_eq!(
                err.downcast_ref::<ExecError>(),
                Some(&ExecError::WrongType)
            );
            assert_eq!(store.lock("key1").value(), Some(&set));
        }
    }
}
