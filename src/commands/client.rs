use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::Error;

/// Connection management. Only the subcommands clients send on their own while connecting are
/// understood. Their arguments are validated, then acknowledged without being stored.
///
/// Ref: <https://redis.io/docs/latest/commands/client/>
#[derive(Debug, PartialEq)]
pub struct Client {
    pub subcommand: String,
    pub args: Vec<Bytes>,
}

impl Guarded for Client {
    const FAMILY: Family = Family::Server;
}

impl Executable for Client {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        let ok = Frame::Simple("OK".to_string());

        let res = match (self.subcommand.as_str(), self.args.as_slice()) {
            ("SETNAME", [name]) if is_plain(name) => ok,
            ("SETNAME", [_]) => Frame::Error(
                "ERR Client names cannot contain spaces, newlines or special characters."
                    .to_string(),
            ),
            ("SETINFO", [attr, value]) => {
                let attr = String::from_utf8_lossy(attr).to_lowercase();
                match attr.as_str() {
                    "lib-name" | "lib-ver" if is_plain(value) => ok,
                    "lib-name" | "lib-ver" => Frame::Error(format!(
                        "ERR {attr} cannot contain spaces, newlines or special characters."
                    )),
                    _ => Frame::Error(format!("ERR Unrecognized option '{attr}'")),
                }
            }
            ("SETNAME" | "SETINFO", _) => Frame::Error(format!(
                "ERR wrong number of arguments for 'client|{}' command",
                self.subcommand.to_lowercase()
            )),
            _ => Frame::Error(format!(
                "ERR unknown subcommand '{}'. Try CLIENT HELP.",
                self.subcommand.to_lowercase()
            )),
        };

        Ok(res)
    }
}

/// Printable ASCII without spaces.
fn is_plain(data: &[u8]) -> bool {
    data.iter().all(|b| (b'!'..=b'~').contains(b))
}

impl TryFrom<&mut CommandParser> for Client {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?.to_uppercase();

        let mut args = vec![];
        while parser.remaining() > 0 {
            args.push(parser.next_bytes()?);
        }

        Ok(Self { subcommand, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::Registry;
    use crate::commands::Command;

    fn frame(parts: &[&'static str]) -> Frame {
        Frame::Array(parts.iter().map(|p| Frame::Bulk(Bytes::from(*p))).collect())
    }

    #[tokio::test]
    async fn setinfo() {
        let cmd = Registry::new()
            .parse(frame(&["CLIENT", "setinfo", "LIB-NAME", "redis-rs"]))
            .unwrap();

        assert_eq!(
            cmd,
            Command::Client(Client {
                subcommand: String::from("SETINFO"),
                args: vec![Bytes::from("LIB-NAME"), Bytes::from("redis-rs")],
            })
        );
        assert_eq!(
            cmd.exec(Store::new()).unwrap(),
            Frame::Simple("OK".to_string())
        );
    }

    #[tokio::test]
    async fn setname() {
        let exec = |parts: &[&'static str]| {
            Registry::new()
                .parse(frame(parts))
                .unwrap()
                .exec(Store::new())
                .unwrap()
        };

        assert_eq!(
            exec(&["CLIENT", "SETNAME", "worker-1"]),
            Frame::Simple("OK".to_string())
        );
        assert_eq!(
            exec(&["CLIENT", "SETNAME", "my worker"]),
            Frame::Error(
                "ERR Client names cannot contain spaces, newlines or special characters."
                    .to_string()
            )
        );
        assert_eq!(
            exec(&["CLIENT", "SETNAME"]),
            Frame::Error("ERR wrong number of arguments for 'client|setname' command".to_string())
        );
    }

    #[tokio::test]
    async fn setinfo_validates_arguments() {
        let exec = |parts: &[&'static str]| {
            Registry::new()
                .parse(frame(parts))
                .unwrap()
                .exec(Store::new())
                .unwrap()
        };

        assert_eq!(
            exec(&["CLIENT", "SETINFO", "lib-ver", "0.25.4"]),
            Frame::Simple("OK".to_string())
        );
        assert_eq!(
            exec(&["CLIENT", "SETINFO", "LIB-NAME", "redis rs"]),
            Frame::Error(
                "ERR lib-name cannot contain spaces, newlines or special characters.".to_string()
            )
        );
        assert_eq!(
            exec(&["CLIENT", "SETINFO", "color", "blue"]),
            Frame::Error("ERR Unrecognized option 'color'".to_string())
        );
        assert_eq!(
            exec(&["CLIENT", "SETINFO", "lib-name"]),
            Frame::Error("ERR wrong number of arguments for 'client|setinfo' command".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_subcommand() {
        let cmd = Registry::new().parse(frame(&["CLIENT", "KILL"])).unwrap();

        assert_eq!(
            cmd.exec(Store::new()).unwrap(),
            Frame::Error("ERR unknown subcommand 'kill'. Try CLIENT HELP.".to_string())
        );
    }
}
