use bytes::Bytes;
use std::collections::VecDeque;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Removes and returns the first elements of the list stored at `key`.
///
/// By default, the command pops a single element from the beginning of the list. When provided
/// with the optional `count` argument, the reply will consist of up to `count` elements, depending
/// on the list's length. The key is removed once its last element is popped.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct Lpop {
    pub key: String,
    pub count: Option<usize>,
}

/// Removes and returns the last elements of the list stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/rpop/>
#[derive(Debug, PartialEq)]
pub struct Rpop {
    pub key: String,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum End {
    Head,
    Tail,
}

impl Guarded for Lpop {
    const FAMILY: Family = Family::List;
}

impl Guarded for Rpop {
    const FAMILY: Family = Family::List;
}

impl Executable for Lpop {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        pop(&store, &self.key, self.count, End::Head)
    }
}

impl Executable for Rpop {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        pop(&store, &self.key, self.count, End::Tail)
    }
}

fn pop(store: &Store, key: &str, count: Option<usize>, end: End) -> Result<Frame, Error> {
    let mut key = store.lock(key);
    key.guard(Family::List)?;

    let res = key.mutate(|value| match value {
        Value::List(list) => Ok(match count {
            None => pop_one(list, end).map_or(Frame::Null, Frame::Bulk),
            Some(count) => {
                let popped = (0..count)
                    .map_while(|_| pop_one(list, end))
                    .map(Frame::Bulk)
                    .collect();
                Frame::Array(popped)
            }
        }),
        Value::String(_) | Value::Set(_) => Err(ExecError::WrongType),
    });

    match (res, count) {
        (Some(res), _) => Ok(res?),
        (None, None) => Ok(Frame::Null),
        (None, Some(_)) => Ok(Frame::NullArray),
    }
}

fn pop_one(list: &mut VecDeque<Bytes>, end: End) -> Option<Bytes> {
    match end {
        End::Head => list.pop_front(),
        End::Tail => list.pop_back(),
    }
}

fn next_count(parser: &mut CommandParser) -> Result<Option<usize>, CommandParserError> {
    if parser.remaining() == 0 {
        return Ok(None);
    }

    let count = parser.next_integer()?;
    usize::try_from(count)
        .map(Some)
        .map_err(|_| CommandParserError::NegativeCount)
}

impl TryFrom<&mut CommandParser> for Lpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let count = next_count(parser)?;

        Ok(Self { key, count })
    }
}

impl TryFrom<&mut CommandParser> for Rpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let count = next_count(parser)?;

        Ok(Self { key, count })
    }
}
