use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError, ExecError};
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::value::Value;
use crate::Error;

/// Count the number of set bits (population counting) in a string.
///
/// By default all the bytes contained in the string are examined. It is possible to specify the
/// counting operation only in an interval passing the additional arguments `start` and `end`. Like
/// for the GETRANGE command `start` and `end` can contain negative values in order to index bytes
/// starting from the end of the string.
///
/// Ref: <https://redis.io/docs/latest/commands/bitcount/>
#[derive(Debug, PartialEq)]
pub struct Bitcount {
    pub key: String,
    pub range: Option<Range>,
}

#[derive(Debug, PartialEq)]
pub struct Range {
    pub start: i64,
    pub end: i64,
    pub unit: Unit,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Unit {
    Byte,
    Bit,
}

impl Guarded for Bitcount {
    const FAMILY: Family = Family::Bit;
}

impl Executable for Bitcount {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut key = store.lock(&self.key);
        key.guard(Self::FAMILY)?;

        let count = match key.value() {
            Some(Value::String(data)) => match self.range {
                Some(range) => count_range(data, range),
                None => count_ones(data),
            },
            Some(Value::List(_) | Value::Set(_)) => return Err(ExecError::WrongType.into()),
            None => 0,
        };

        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Bitcount {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        let range = match parser.remaining() {
            0 => None,
            // A start index without an end.
            1 => return Err(CommandParserError::SyntaxError.into()),
            _ => {
                let start = parser.next_integer()?;
                let end = parser.next_integer()?;

                let unit = match parser.next_keyword()?.as_deref() {
                    None | Some("BYTE") => Unit::Byte,
                    Some("BIT") => Unit::Bit,
                    Some(_) => return Err(CommandParserError::SyntaxError.into()),
                };

                Some(Range { start, end, unit })
            }
        };

        Ok(Self { key, range })
    }
}

fn count_ones(data: &[u8]) -> u64 {
    data.iter().map(|byte| byte.count_ones() as u64).sum()
}

fn count_range(data: &[u8], range: Range) -> u64 {
    let len = match range.unit {
        Unit::Byte => data.len() as i64,
        Unit::Bit => data.len() as i64 * 8,
    };

    let Some((start, end)) = normalize(range.start, range.end, len) else {
        return 0;
    };

    match range.unit {
        Unit::Byte => count_ones(&data[start..=end]),
        Unit::Bit => {
            let (first, last) = (start / 8, end / 8);
            let mut bytes = data[first..=last].to_vec();

            // Clear the bits outside of the range in the first and last bytes.
            bytes[0] &= 0xffu8 >> (start % 8);
            let tail = bytes.len() - 1;
            bytes[tail] &= 0xffu8 << (7 - end % 8);

            count_ones(&bytes)
        }
    }
}

/// Resolves a pair of inclusive, possibly negative, indices against a sequence of `len` items.
/// Returns `None` when the range selects nothing.
pub(crate) fn normalize(start: i64, end: i64, len: i64) -> Option<(usize, usize)> {
    let resolve = |index: i64| if index < 0 { len + index } else { index };

    let start = resolve(start).max(0);
    let end = resolve(end).min(len - 1);

    if len == 0 || end < 0 || start > end {
        return None;
    }

    Some((start as usize, end as usize))
}
