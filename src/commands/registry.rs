use itertools::Itertools;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::commands::executable::Executable;
use crate::commands::*;
use crate::frame::Frame;
use crate::guard::{Family, Guarded};
use crate::store::Store;
use crate::Error;

pub type ParseFn = fn(&mut CommandParser) -> Result<Command, Error>;

/// Number of arguments a command takes, not counting its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(self, args: usize) -> bool {
        match self {
            Arity::Exact(n) => args == n,
            Arity::AtLeast(n) => args >= n,
            Arity::Between(min, max) => (min..=max).contains(&args),
        }
    }
}

/// A command table entry.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Lowercase command name.
    pub name: &'static str,
    pub arity: Arity,
    /// Value types the command may operate on. Handlers enforce it themselves through
    /// [`Guarded::FAMILY`], which this field is copied from; the table only reports it.
    pub family: Family,
    parse: ParseFn,
}

/// The command table: resolves command names to their parser, arity and family.
///
/// Built once when the server starts and shared by every connection. It never changes afterwards.
#[derive(Clone)]
pub struct Registry {
    commands: HashMap<&'static str, CommandSpec>,
}

impl Registry {
    pub fn new() -> Registry {
        let mut registry = Registry {
            commands: HashMap::new(),
        };

        // Strings.
        registry.register::<Get>("get", Arity::Exact(1), |p| {
            Get::try_from(p).map(Command::Get)
        });
        registry.register::<Getdel>("getdel", Arity::Exact(1), |p| {
            Getdel::try_from(p).map(Command::Getdel)
        });
        registry.register::<Getex>("getex", Arity::AtLeast(1), |p| {
            Getex::try_from(p).map(Command::Getex)
        });
        registry.register::<Getset>("getset", Arity::Exact(2), |p| {
            Getset::try_from(p).map(Command::Getset)
        });
        registry.register::<Set>("set", Arity::AtLeast(2), |p| {
            Set::try_from(p).map(Command::Set)
        });

        // Counters.
        registry.register::<Incr>("incr", Arity::Exact(1), |p| {
            Incr::try_from(p).map(Command::Incr)
        });
        registry.register::<Decr>("decr", Arity::Exact(1), |p| {
            Decr::try_from(p).map(Command::Decr)
        });
        registry.register::<IncrBy>("incrby", Arity::Exact(2), |p| {
            IncrBy::try_from(p).map(Command::IncrBy)
        });
        registry.register::<DecrBy>("decrby", Arity::Exact(2), |p| {
            DecrBy::try_from(p).map(Command::DecrBy)
        });

        // Bitmaps.
        registry.register::<Getbit>("getbit", Arity::Exact(2), |p| {
            Getbit::try_from(p).map(Command::Getbit)
        });
        registry.register::<Setbit>("setbit", Arity::Exact(3), |p| {
            Setbit::try_from(p).map(Command::Setbit)
        });
        registry.register::<Bitcount>("bitcount", Arity::AtLeast(1), |p| {
            Bitcount::try_from(p).map(Command::Bitcount)
        });

        // Lists.
        registry.register::<Lpush>("lpush", Arity::AtLeast(2), |p| {
            Lpush::try_from(p).map(Command::Lpush)
        });
        registry.register::<Rpush>("rpush", Arity::AtLeast(2), |p| {
            Rpush::try_from(p).map(Command::Rpush)
        });
        registry.register::<Lpop>("lpop", Arity::Between(1, 2), |p| {
            Lpop::try_from(p).map(Command::Lpop)
        });
        registry.register::<Rpop>("rpop", Arity::Between(1, 2), |p| {
            Rpop::try_from(p).map(Command::Rpop)
        });
        registry.register::<Llen>("llen", Arity::Exact(1), |p| {
            Llen::try_from(p).map(Command::Llen)
        });
        registry.register::<Lrange>("lrange", Arity::Exact(3), |p| {
            Lrange::try_from(p).map(Command::Lrange)
        });

        // Sets.
        registry.register::<Sadd>("sadd", Arity::AtLeast(2), |p| {
            Sadd::try_from(p).map(Command::Sadd)
        });
        registry.register::<Srem>("srem", Arity::AtLeast(2), |p| {
            Srem::try_from(p).map(Command::Srem)
        });
        registry.register::<Smembers>("smembers", Arity::Exact(1), |p| {
            Smembers::try_from(p).map(Command::Smembers)
        });
        registry.register::<Sismember>("sismember", Arity::Exact(2), |p| {
            Sismember::try_from(p).map(Command::Sismember)
        });
        registry.register::<Scard>("scard", Arity::Exact(1), |p| {
            Scard::try_from(p).map(Command::Scard)
        });

        // Keys.
        registry.register::<Del>("del", Arity::AtLeast(1), |p| {
            Del::try_from(p).map(Command::Del)
        });
        registry.register::<Exists>("exists", Arity::AtLeast(1), |p| {
            Exists::try_from(p).map(Command::Exists)
        });
        registry.register::<Type>("type", Arity::Exact(1), |p| {
            Type::try_from(p).map(Command::Type)
        });
        registry.register::<Ttl>("ttl", Arity::Exact(1), |p| {
            Ttl::try_from(p).map(Command::Ttl)
        });
        registry.register::<Pttl>("pttl", Arity::Exact(1), |p| {
            Pttl::try_from(p).map(Command::Pttl)
        });

        // Server.
        registry.register::<Ping>("ping", Arity::Between(0, 1), |p| {
            Ping::try_from(p).map(Command::Ping)
        });
        registry.register::<DBSize>("dbsize", Arity::Exact(0), |p| {
            DBSize::try_from(p).map(Command::DBSize)
        });
        registry.register::<Client>("client", Arity::AtLeast(1), |p| {
            Client::try_from(p).map(Command::Client)
        });

        registry
    }

    fn register<C: Guarded>(&mut self, name: &'static str, arity: Arity, parse: ParseFn) {
        let spec = CommandSpec {
            name,
            arity,
            family: C::FAMILY,
            parse,
        };
        self.commands.insert(name, spec);
    }

    /// Looks a command up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name.to_lowercase().as_str())
    }

    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    /// Turns a client frame into a command, validating the command name and the number of
    /// arguments.
    pub fn parse(&self, frame: Frame) -> Result<Command, Error> {
        // Clients send commands to the Redis server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let parser = &mut CommandParser::new(frames);
        let command_name = parser.parse_command_name()?;

        let Some(spec) = self.commands.get(command_name.as_str()) else {
            let args = parser
                .parts
                .as_slice()
                .iter()
                .map(|frame| match frame {
                    Frame::Bulk(bytes) => format!("'{}'", String::from_utf8_lossy(bytes)),
                    frame => format!("'{}'", frame),
                })
                .join(" ");

            return Err(CommandParserError::UnknownCommand {
                command: command_name,
                args,
            }
            .into());
        };

        if !spec.arity.accepts(parser.remaining()) {
            return Err(CommandParserError::WrongArity {
                command: command_name,
            }
            .into());
        }

        trace!(command = spec.name, family = ?spec.family, "Parsing command");

        let command = (spec.parse)(parser)?;
        parser.finish()?;

        Ok(command)
    }

    /// Parses and executes a frame. Command failures are turned into error replies: they concern
    /// the command only, never the connection.
    pub fn dispatch(&self, frame: Frame, store: &Store) -> Frame {
        match self.parse(frame).and_then(|cmd| cmd.exec(store.clone())) {
            Ok(res) => res,
            Err(err) => {
                debug!("Command failed: {}", err);
                Frame::Error(err.to_string())
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
