use bytes::Bytes;
use tokio::time::Instant;

use crate::commands::executable::Executable;
use crate::commands::get::Get;
use crate::commands::{CommandParser, CommandParserError, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::{Expiry, Value};
use crate::Error;

/// Set `key` to hold the string `value`. If `key` already holds a value, it is overwritten,
/// regardless of its type. Any previous time to live associated with the key is discarded on
/// successful SET operation, unless `KEEPTTL` is given.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
    pub ttl: Option<Ttl>,
    pub condition: Option<Condition>,
    /// Return the old string stored at key, or nil if key did not exist.
    pub get: bool,
}

#[derive(Debug, PartialEq)]
pub enum Ttl {
    Expire(Expiry),
    KeepTtl,
}

#[derive(Debug, PartialEq)]
pub enum Condition {
    /// Only set the key if it does not already exist.
    Nx,
    /// Only set the key if it already exists.
    Xx,
}

impl Guarded for Set {
    const FAMILY: Family = Family::Keyspace;
}

impl Executable for Set {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let previous = if self.get {
            // With GET, SET also reads the old value, and that only works on strings.
            key.guard(Get::FAMILY)?;
            match key.value() {
                Some(Value::String(data)) => Frame::Bulk(data.clone()),
                Some(Value::List(_) | Value::Set(_)) => return Err(ExecError::WrongType.into()),
                None => Frame::Null,
            }
        } else {
            Frame::Null
        };

        let exists = key.exists();
        let apply = match self.condition {
            Some(Condition::Nx) => !exists,
            Some(Condition::Xx) => exists,
            None => true,
        };

        if !apply {
            return Ok(previous);
        }

        let expires_at = match self.ttl {
            Some(Ttl::Expire(expiry)) => Some(expiry.deadline(Instant::now()).ok_or_else(|| {
                CommandParserError::InvalidExpireTime {
                    command: "set".to_string(),
                }
            })?),
            Some(Ttl::KeepTtl) => key.get().and_then(|entry| entry.expires_at),
            None => None,
        };

        key.set(Value::String(self.value), expires_at);

        match self.get {
            true => Ok(previous),
            false => Ok(Frame::Simple("OK".to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;

        let mut ttl = None;
        let mut condition = None;
        let mut get = false;

        while let Some(option) = parser.next_keyword()? {
            match option.as_str() {
                // TTL options
                "EX" | "PX" | "EXAT" | "PXAT" if ttl.is_none() => {
                    let expiry = parser.next_expiry(&option, "set")?;
                    ttl = Some(Ttl::Expire(expiry));
                }
                "KEEPTTL" if ttl.is_none() => {
                    ttl = Some(Ttl::KeepTtl);
                }

                // Condition options
                "NX" if condition.is_none() => {
                    condition = Some(Condition::Nx);
                }
                "XX" if condition.is_none() => {
                    condition = Some(Condition::Xx);
                }

                "GET" if !get => {
                    get = true;
                }

                // Unexpected option
                _ => return Err(CommandParserError::SyntaxError.into()),
            }
        }

        Ok(Self {
            key,
            value,
            ttl,
            condition,
            get,
        })
    }
}
