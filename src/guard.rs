use strum_macros::EnumIter;

use crate::commands::ExecError;
use crate::value::Tag;

/// Groups commands by the kind of stored value they operate on.
///
/// Every command declares its family once, through [`Guarded`]. Before touching a key, the command
/// checks the key's current tag against its family and fails with `WRONGTYPE` if the two don't
/// match, leaving the key untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Family {
    /// GET, GETDEL, GETEX, GETSET.
    String,
    /// INCR, DECR, INCRBY, DECRBY.
    Counter,
    /// GETBIT, SETBIT, BITCOUNT.
    Bit,
    /// LPUSH, RPUSH, LPOP, RPOP, LLEN, LRANGE.
    List,
    /// SADD, SREM, SMEMBERS, SISMEMBER, SCARD.
    Set,
    /// Commands that work on any key regardless of its type, like DEL or TYPE.
    Keyspace,
    /// Commands that don't address a key.
    Server,
}

impl Family {
    /// Whether a command of this family may operate on a value tagged `tag`.
    pub fn accepts(self, tag: Tag) -> bool {
        use Family as F;

        // Exhaustive over tags: every family must classify every tag.
        match (self, tag) {
            (F::String | F::Counter | F::Bit, Tag::String) => true,
            (F::String | F::Counter | F::Bit, Tag::List | Tag::Set) => false,
            (F::List, Tag::List) => true,
            (F::List, Tag::String | Tag::Set) => false,
            (F::Set, Tag::Set) => true,
            (F::Set, Tag::String | Tag::List) => false,
            (F::Keyspace | F::Server, Tag::String | Tag::List | Tag::Set) => true,
        }
    }
}

/// Declares which family a command belongs to.
pub trait Guarded {
    const FAMILY: Family;
}

/// Checks the tag of the value currently stored at a key, if any, against `family`.
pub fn check(family: Family, existing: Option<Tag>) -> Result<(), ExecError> {
    match existing {
        Some(tag) if !family.accepts(tag) => Err(ExecError::WrongType),
        _ => Ok(()),
    }
}
