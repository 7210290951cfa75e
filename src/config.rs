use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use super::error::{Error, Result};

const DEFAULT_DATABASE_URL: &str = "cellar.db";
const DEFAULT_LISTEN_IP: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "5000";
const DEFAULT_POOL_SIZE: &str = "4";

/// Runtime settings, read from the environment (and `.env`, if present).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub pool_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let port = parse::<u16>("PORT", &var("PORT", DEFAULT_PORT))?;
        let ip = parse::<IpAddr>("LISTEN_IP", &var("LISTEN_IP", DEFAULT_LISTEN_IP))?;
        let pool_size = parse::<u32>(
            "DATABASE_POOL_SIZE",
            &var("DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE),
        )?;
        if pool_size == 0 {
            return Err(Error::Config("DATABASE_POOL_SIZE must be at least 1".into()));
        }

        Ok(Config {
            database_url: var("DATABASE_URL", DEFAULT_DATABASE_URL),
            listen_addr: SocketAddr::new(ip, port),
            pool_size,
        })
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("failed to parse ${} from `{}`", key, value)))
}
