use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::getbit::{bit_at, next_offset};
use crate::commands::{parse_integer, CommandParser, CommandParserError, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Sets or clears the bit at `offset` in the string value stored at `key`, returning the bit it
/// held before.
///
/// The string is grown with zero bytes to make sure it can hold a bit at `offset`. The key keeps
/// its expiration.
///
/// Ref: <https://redis.io/docs/latest/commands/setbit/>
#[derive(Debug, PartialEq)]
pub struct Setbit {
    pub key: String,
    pub offset: u64,
    pub bit: bool,
}

impl Guarded for Setbit {
    const FAMILY: Family = Family::Bit;
}

impl Executable for Setbit {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let (mut data, expires_at) = match key.get() {
            Some(entry) => match &entry.value {
                Value::String(data) => (data.to_vec(), entry.expires_at),
                Value::List(_) | Value::Set(_) => return Err(ExecError::WrongType.into()),
            },
            None => (Vec::new(), None),
        };

        let previous = bit_at(&data, self.offset);

        let byte = (self.offset / 8) as usize;
        if data.len() <= byte {
            data.resize(byte + 1, 0);
        }

        let mask = 1u8 << (7 - (self.offset % 8) as u8);
        match self.bit {
            true => data[byte] |= mask,
            false => data[byte] &= !mask,
        }

        key.set(Value::String(Bytes::from(data)), expires_at);

        Ok(Frame::Integer(previous as i64))
    }
}

impl TryFrom<&mut CommandParser> for Setbit {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let offset = next_offset(parser)?;

        let bit = match parse_integer(&parser.next_bytes()?) {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(CommandParserError::InvalidBit.into()),
        };

        Ok(Self { key, offset, bit })
    }
}
