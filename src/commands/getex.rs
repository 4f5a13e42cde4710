use tokio::time::Instant;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::{Expiry, Value};
use crate::Error;

/// Get the value of key and optionally set its expiration.
///
/// Ref: <https://redis.io/docs/latest/commands/getex/>
#[derive(Debug, PartialEq)]
pub struct Getex {
    pub key: String,

    pub ttl: Option<Ttl>,
}

#[derive(Debug, PartialEq)]
pub enum Ttl {
    Expire(Expiry),
    Persist, // Remove the expiration.
}

impl Guarded for Getex {
    const FAMILY: Family = Family::String;
}

impl Executable for Getex {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let value = match key.value() {
            Some(Value::String(data)) => data.clone(),
            Some(Value::List(_) | Value::Set(_)) => return Err(ExecError::WrongType.into()),
            None => return Ok(Frame::Null),
        };

        match self.ttl {
            Some(Ttl::Persist) => {
                key.set_expiry(None);
            }
            Some(Ttl::Expire(expiry)) => {
                let now = Instant::now();
                let expires_at =
                    expiry
                        .deadline(now)
                        .ok_or_else(|| CommandParserError::InvalidExpireTime {
                            command: "getex".to_string(),
                        })?;

                if expires_at <= now {
                    key.delete();
                } else {
                    key.set_expiry(Some(expires_at));
                }
            }
            None => {}
        }

        Ok(Frame::Bulk(value))
    }
}

impl TryFrom<&mut CommandParser> for Getex {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        let mut ttl = None;

        while let Some(option) = parser.next_keyword()? {
            match option.as_str() {
                "EX" | "PX" | "EXAT" | "PXAT" if ttl.is_none() => {
                    let expiry = parser.next_expiry(&option, "getex")?;
                    ttl = Some(Ttl::Expire(expiry));
                }
                "PERSIST" if ttl.is_none() => {
                    ttl = Some(Ttl::Persist);
                }

                // Unexpected option
                _ => return Err(CommandParserError::SyntaxError.into()),
            }
        }

        Ok(Self { key, ttl })
    }
}
