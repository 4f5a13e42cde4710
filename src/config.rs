use clap::Parser;
use std::net::{IpAddr, Ipv4Addr};
use tracing::Level;

use crate::codec::MAX_FRAME_SIZE;
use crate::store::DEFAULT_SHARDS;

pub const DEFAULT_PORT: u16 = 6379;

/// Server settings, read from the command line or from `TYPEDIS_*` environment variables.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "typedis", version, about)]
pub struct Config {
    /// The address to listen on
    #[arg(short, long, env = "TYPEDIS_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// The port to listen on
    #[arg(short, long, env = "TYPEDIS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Number of independently locked partitions of the key space
    #[arg(long, env = "TYPEDIS_SHARDS", default_value_t = DEFAULT_SHARDS, value_parser = parse_shards)]
    pub shards: usize,

    /// Largest request a client may send, in bytes
    #[arg(long, env = "TYPEDIS_MAX_FRAME_SIZE", default_value_t = MAX_FRAME_SIZE)]
    pub max_frame_size: usize,

    /// Most verbose level logged (trace, debug, info, warn or error)
    #[arg(long, env = "TYPEDIS_LOG_LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            shards: DEFAULT_SHARDS,
            max_frame_size: MAX_FRAME_SIZE,
            log_level: Level::INFO,
        }
    }
}

fn parse_shards(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("at least one shard is required".to_string()),
        Ok(shards) => Ok(shards),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition() {
        Config::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["typedis"]).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags() {
        let config = Config::try_parse_from([
            "typedis",
            "--bind",
            "0.0.0.0",
            "--port",
            "7000",
            "--shards",
            "4",
            "--max-frame-size",
            "1024",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(
            config,
            Config {
                bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                port: 7000,
                shards: 4,
                max_frame_size: 1024,
                log_level: Level::DEBUG,
            }
        );
    }

    #[test]
    fn invalid_values() {
        assert!(Config::try_parse_from(["typedis", "--shards", "0"]).is_err());
        assert!(Config::try_parse_from(["typedis", "--port", "70000"]).is_err());
        assert!(Config::try_parse_from(["typedis", "--log-level", "loud"]).is_err());
    }
}
