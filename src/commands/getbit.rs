use crate::commands::executable::Executable;
use crate::commands::{parse_integer, CommandParser, CommandParserError, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Offsets address at most 512 MiB of payload.
const MAX_BIT_OFFSET: u64 = (1 << 32) - 1;

/// Returns the bit value at `offset` in the string value stored at `key`.
///
/// When offset is beyond the string length, the string is assumed to be a contiguous space with 0
/// bits. When key does not exist it is assumed to be an empty string, so offset is always out of
/// range and the value is also assumed to be a contiguous space with 0 bits.
///
/// Ref: <https://redis.io/docs/latest/commands/getbit/>
#[derive(Debug, PartialEq)]
pub struct Getbit {
    pub key: String,
    pub offset: u64,
}

impl Guarded for Getbit {
    const FAMILY: Family = Family::Bit;
}

impl Executable for Getbit {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let bit = match key.value() {
            Some(Value::String(data)) => bit_at(data, self.offset),
            Some(Value::List(_) | Value::Set(_)) => return Err(ExecError::WrongType.into()),
            None => 0,
        };

        Ok(Frame::Integer(bit as i64))
    }
}

impl TryFrom<&mut CommandParser> for Getbit {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let offset = next_offset(parser)?;

        Ok(Self { key, offset })
    }
}

/// Reads a bit offset, rejecting negative values and values past [`MAX_BIT_OFFSET`].
pub(crate) fn next_offset(parser: &mut CommandParser) -> Result<u64, CommandParserError> {
    let bytes = parser.next_bytes()?;

    parse_integer(&bytes)
        .and_then(|offset| u64::try_from(offset).ok())
        .filter(|offset| *offset <= MAX_BIT_OFFSET)
        .ok_or(CommandParserError::InvalidBitOffset)
}

/// Bits are numbered from the most significant bit of the first byte.
pub(crate) fn bit_at(data: &[u8], offset: u64) -> u8 {
    let byte = (offset / 8) as usize;
    let shift = 7 - (offset % 8) as u8;

    data.get(byte).map_or(0, |byte| (byte >> shift) & 1)
}
