pub mod bitcount;
pub mod client;
pub mod dbsize;
pub mod decr;
pub mod decrby;
pub mod del;
pub mod executable;
pub mod exists;
pub mod get;
pub mod getbit;
pub mod getdel;
pub mod getex;
pub mod getset;
pub mod incr;
pub mod incrby;
pub mod llen;
pub mod lrange;
pub mod ping;
pub mod pop;
pub mod pttl;
pub mod push;
pub mod registry;
pub mod sadd;
pub mod scard;
pub mod set;
pub mod setbit;
pub mod sismember;
pub mod smembers;
pub mod srem;
pub mod ttl;
pub mod type_;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::value::{unix_millis, Expiry};
use crate::Error;

use bitcount::Bitcount;
use client::Client;
use dbsize::DBSize;
use decr::Decr;
use decrby::DecrBy;
use del::Del;
use exists::Exists;
use get::Get;
use getbit::Getbit;
use getdel::Getdel;
use getex::Getex;
use getset::Getset;
use incr::Incr;
use incrby::IncrBy;
use llen::Llen;
use lrange::Lrange;
use ping::Ping;
use pop::{Lpop, Rpop};
use pttl::Pttl;
use push::{Lpush, Rpush};
use sadd::Sadd;
use scard::Scard;
use set::Set;
use setbit::Setbit;
use sismember::Sismember;
use smembers::Smembers;
use srem::Srem;
use ttl::Ttl;
use type_::Type;

#[derive(Debug, PartialEq)]
pub enum Command {
    Get(Get),
    Getdel(Getdel),
    Getex(Getex),
    Getset(Getset),
    Set(Set),

    Decr(Decr),
    DecrBy(DecrBy),
    Incr(Incr),
    IncrBy(IncrBy),

    Bitcount(Bitcount),
    Getbit(Getbit),
    Setbit(Setbit),

    Llen(Llen),
    Lpop(Lpop),
    Lpush(Lpush),
    Lrange(Lrange),
    Rpop(Rpop),
    Rpush(Rpush),

    Sadd(Sadd),
    Scard(Scard),
    Sismember(Sismember),
    Smembers(Smembers),
    Srem(Srem),

    Del(Del),
    Exists(Exists),
    Pttl(Pttl),
    Ttl(Ttl),
    Type(Type),

    Client(Client),
    DBSize(DBSize),
    Ping(Ping),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Bitcount(cmd) => cmd.exec(store),
            Command::Client(cmd) => cmd.exec(store),
            Command::DBSize(cmd) => cmd.exec(store),
            Command::Decr(cmd) => cmd.exec(store),
            Command::DecrBy(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Exists(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Getbit(cmd) => cmd.exec(store),
            Command::Getdel(cmd) => cmd.exec(store),
            Command::Getex(cmd) => cmd.exec(store),
            Command::Getset(cmd) => cmd.exec(store),
            Command::Incr(cmd) => cmd.exec(store),
            Command::IncrBy(cmd) => cmd.exec(store),
            Command::Llen(cmd) => cmd.exec(store),
            Command::Lpop(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Lrange(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Pttl(cmd) => cmd.exec(store),
            Command::Rpop(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Sadd(cmd) => cmd.exec(store),
            Command::Scard(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Setbit(cmd) => cmd.exec(store),
            Command::Sismember(cmd) => cmd.exec(store),
            Command::Smembers(cmd) => cmd.exec(store),
            Command::Srem(cmd) => cmd.exec(store),
            Command::Ttl(cmd) => cmd.exec(store),
            Command::Type(cmd) => cmd.exec(store),
        }
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    pub(crate) fn new(parts: Vec<Frame>) -> CommandParser {
        CommandParser {
            parts: parts.into_iter(),
        }
    }

    /// Number of arguments not consumed yet.
    pub fn remaining(&self) -> usize {
        self.parts.len()
    }

    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self.next_frame()?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_frame(&mut self) -> Result<Frame, CommandParserError> {
        self.parts.next().ok_or(CommandParserError::EndOfStream)
    }

    pub fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.next_frame()?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    pub fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self.next_frame()?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => {
                parse_integer(string.as_bytes()).ok_or(CommandParserError::InvalidInteger)
            }
            Frame::Bulk(bytes) => parse_integer(&bytes).ok_or(CommandParserError::InvalidInteger),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    pub fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.next_frame()?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Reads an option keyword, uppercased. Returns `None` when there are no arguments left.
    pub fn next_keyword(&mut self) -> Result<Option<String>, CommandParserError> {
        match self.next_string() {
            Ok(keyword) => Ok(Some(keyword.to_uppercase())),
            Err(CommandParserError::EndOfStream) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Reads every remaining argument as bytes. Fails if there is none.
    pub fn rest_bytes(&mut self) -> Result<Vec<Bytes>, CommandParserError> {
        let mut values = vec![self.next_bytes()?];
        while self.remaining() > 0 {
            values.push(self.next_bytes()?);
        }
        Ok(values)
    }

    /// Reads every remaining argument as a string. Fails if there is none.
    pub fn rest_strings(&mut self) -> Result<Vec<String>, CommandParserError> {
        let mut values = vec![self.next_string()?];
        while self.remaining() > 0 {
            values.push(self.next_string()?);
        }
        Ok(values)
    }

    /// Reads the amount following an expiration keyword (`EX`, `PX`, `EXAT` or `PXAT`).
    pub fn next_expiry(
        &mut self,
        keyword: &str,
        command: &str,
    ) -> Result<Expiry, CommandParserError> {
        let invalid = || CommandParserError::InvalidExpireTime {
            command: command.to_string(),
        };

        let amount = self.next_integer()?;
        if amount <= 0 {
            return Err(invalid());
        }
        let amount = amount as u64;

        let expiry = match keyword {
            "EX" => Expiry::Ex(amount),
            "PX" => Expiry::Px(amount),
            "EXAT" => Expiry::ExAt(amount),
            "PXAT" => Expiry::PxAt(amount),
            _ => return Err(CommandParserError::SyntaxError),
        };

        // The absolute deadline must fit in milliseconds as a signed 64-bit integer.
        let deadline = match expiry {
            Expiry::Ex(_) => amount
                .checked_mul(1000)
                .and_then(|ms| ms.checked_add(unix_millis())),
            Expiry::Px(_) => amount.checked_add(unix_millis()),
            Expiry::ExAt(_) => amount.checked_mul(1000),
            Expiry::PxAt(_) => Some(amount),
        };
        if deadline.map_or(true, |deadline| deadline > i64::MAX as u64) {
            return Err(invalid());
        }

        Ok(expiry)
    }

    /// Fails if any argument was left unconsumed.
    pub fn finish(&mut self) -> Result<(), CommandParserError> {
        match self.remaining() {
            0 => Ok(()),
            _ => Err(CommandParserError::SyntaxError),
        }
    }
}

/// Parses a base-10 signed 64-bit integer the way Redis does: no sign other than a leading `-`, no
/// leading zeros and no surrounding whitespace.
pub(crate) fn parse_integer(bytes: &[u8]) -> Option<i64> {
    // The longest representable value, "-9223372036854775808", has 20 bytes.
    if bytes.is_empty() || bytes.len() > 20 {
        return None;
    }

    let digits = match bytes {
        [b'-', rest @ ..] => rest,
        _ => bytes,
    };

    match digits {
        [] => return None,
        [b'0'] if digits.len() == bytes.len() => return Some(0),
        [b'0', ..] => return None,
        _ if !digits.iter().all(u8::is_ascii_digit) => return None,
        _ => {}
    }

    str::from_utf8(bytes).ok()?.parse::<i64>().ok()
}

/// Errors raised while turning a frame into a command, before any key is touched.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("ERR protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR unknown command '{command}', with args beginning with: {args}")]
    UnknownCommand { command: String, args: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArity { command: String },
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("ERR value is not an integer or out of range")]
    InvalidInteger,
    #[error("ERR bit offset is not an integer or out of range")]
    InvalidBitOffset,
    #[error("ERR bit is not an integer or out of range")]
    InvalidBit,
    #[error("ERR invalid expire time in '{command}' command")]
    InvalidExpireTime { command: String },
    #[error("ERR value is out of range, must be positive")]
    NegativeCount,
    #[error("ERR protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("ERR protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

/// Errors raised while executing a command against the value stored at a key. They are detected
/// before anything is written, so a failed command never leaves a key half updated.
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotInteger,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
}
