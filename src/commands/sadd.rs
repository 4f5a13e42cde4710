use bytes::Bytes;
use std::collections::HashSet;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::{Entry, Value};
use crate::Error;

/// Add the specified members to the set stored at `key`. Specified members that are already a
/// member of this set are ignored. If `key` does not exist, a new set is created before adding the
/// specified members.
///
/// Ref: <https://redis.io/docs/latest/commands/sadd/>
#[derive(Debug, PartialEq)]
pub struct Sadd {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Guarded for Sadd {
    const FAMILY: Family = Family::Set;
}

impl Executable for Sadd {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let added = match key.get_mut() {
            Some(Entry {
                value: Value::Set(set),
                ..
            }) => insert(set, self.members),
            Some(_) => return Err(ExecError::WrongType.into()),
            None => {
                let mut set = HashSet::with_capacity(self.members.len());
                let added = insert(&mut set, self.members);

                key.set(Value::Set(set), None);
                added
            }
        };

        Ok(Frame::Integer(added as i64))
    }
}

fn insert(set: &mut HashSet<Bytes>, members: Vec<Bytes>) -> usize {
    members
        .into_iter()
        .filter(|member| set.insert(member.clone()))
        .count()
}

impl TryFrom<&mut CommandParser> for Sadd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.rest_bytes()?;

        Ok(Self { key, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::Registry;
    use crate::value::Tag;

    fn sadd(store: &Store, members: &[&'static str]) -> Result<Frame, Error> {
        let mut frames = vec![
            Frame::Bulk(Bytes::from("SADD")),
            Frame::Bulk(Bytes::from("key1")),
        ];
        frames.extend(members.iter().map(|m| Frame::Bulk(Bytes::from(*m))));

        Registry::new().parse(Frame::Array(frames))?.exec(store.clone())
    }

    #[tokio::test]
    async fn counts_new_members_only() {
        let store = Store::new();

        assert_eq!(sadd(&store, &["bar"]).unwrap(), Frame::Integer(1));
        assert_eq!(sadd(&store, &["bar"]).unwrap(), Frame::Integer(0));
        assert_eq!(sadd(&store, &["bar", "baz", "baz"]).unwrap(), Frame::Integer(1));

        assert_eq!(store.lock("key1").tag(), Some(Tag::Set));
        assert_eq!(
            store.lock("key1").value(),
            Some(&Value::Set(HashSet::from([
                Bytes::from("bar"),
                Bytes::from("baz")
            ])))
        );
    }

    #[tokio::test]
    async fn wrong_type() {
        let store = Store::new();
        store.lock("key1").set(Value::from("bar"), None);

        let err = sadd(&store, &["bar"]).unwrap_err();

        assert_eq!(
            err.downcast_ref::<ExecError>(),
            Some(&ExecError::WrongType)
        );
        assert_eq!(store.lock("key1").value(), Some(&Value::from("bar")));
    }
}
