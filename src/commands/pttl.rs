use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::{Store, TimeToLive};
use crate::Error;

/// Like TTL this command returns the remaining time to live of a key that has an expire set, with
/// the sole difference that TTL returns the amount of remaining time in seconds while PTTL returns
/// it in milliseconds.
///
/// Ref: <https://redis.io/docs/latest/commands/pttl/>
#[derive(Debug, PartialEq)]
pub struct Pttl {
    pub key: String,
}

impl Guarded for Pttl {
    const FAMILY: Family = Family::Keyspace;
}

impl Executable for Pttl {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let ttl = match store.lock(&self.key).ttl() {
            TimeToLive::NotFound => -2,
            TimeToLive::NoExpiry => -1,
            TimeToLive::Remaining(ttl) => ttl.as_millis() as i64,
        };

        Ok(Frame::Integer(ttl))
    }
}

impl TryFrom<&mut CommandParser> for Pttl {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use std::collections::VecDeque;
    use tokio::time::{self, Duration, Instant};

    use super::*;
    use crate::commands::registry::Registry;
    use crate::commands::Command;
    use crate::value::Value;

    fn pttl_frame() -> Frame {
        Frame::Array(vec![
            Frame::Bulk(Bytes::from("PTTL")),
            Frame::Bulk(Bytes::from("key1")),
        ])
    }

    #[tokio::test]
    async fn remaining_milliseconds() {
        time::pause();
        let store = Store::new();

        let cmd = Registry::new().parse(pttl_frame()).unwrap();
        assert_eq!(
            cmd,
            Command::Pttl(Pttl {
                key: String::from("key1")
            })
        );
        assert_eq!(cmd.exec(store.clone()).unwrap(), Frame::Integer(-2));

        // Expirations apply to every type.
        store.lock("key1").set(
            Value::List(VecDeque::from([Bytes::from("a")])),
            Some(Instant::now() + Duration::from_millis(1500)),
        );
        time::advance(Duration::from_millis(250)).await;

        let cmd = Registry::new().parse(pttl_frame()).unwrap();
        assert_eq!(cmd.exec(store.clone()).unwrap(), Frame::Integer(1250));
    }
}
