#![forbid(unsafe_code)]

use std::path::PathBuf;
use thiserror::Error;

pub const SERVER_NAME: &str = "ss_server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_STORAGE_DIR: &str = ".streamstory";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BCRYPT_COST: u32 = 10;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub storage_dir: PathBuf,
    pub port: u16,
    /// Base for links sent by mail (activation, password reset).
    pub host_url: String,
    /// Mails are written here when set, otherwise only logged.
    pub mail_outbox: Option<PathBuf>,
    pub bcrypt_cost: u32,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("invalid bcrypt cost: {0}")]
    InvalidBcryptCost(String),
    #[error("missing value for {0}")]
    MissingValue(&'static str),
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// CLI flags win over environment variables, which win over defaults.
    pub fn from_sources(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let port = parse_port(args, &env)?;
        let host_url = flag_or_env(args, "--host-url", "SS_HOST", &env)?
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("http://127.0.0.1:{port}"));
        Ok(Self {
            storage_dir: parse_storage_dir(args, &env)?,
            port,
            host_url,
            mail_outbox: flag_or_env(args, "--mail-outbox", "SS_MAIL_OUTBOX", &env)?
                .map(PathBuf::from),
            bcrypt_cost: parse_bcrypt_cost(args, &env)?,
            log_level: flag_or_env(args, "--log-level", "SS_LOG", &env)?
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_file: flag_value(args, "--log-file")?.map(PathBuf::from),
        })
    }
}

pub fn usage() -> &'static str {
    "ss_server: StreamStory API server (auth and multi-scale Markov model views)\n\n\
USAGE:\n\
  ss_server [--storage-dir DIR] [--port PORT] [--host-url URL]\n\
            [--mail-outbox DIR] [--bcrypt-cost N] [--log-level FILTER] [--log-file PATH]\n\
\n\
FLAGS:\n\
  -h, --help       Print this help and exit\n\
  -V, --version    Print version and exit\n\
\n\
ENV:\n\
  SS_STORAGE_DIR, SS_PORT, SS_HOST, SS_MAIL_OUTBOX, SS_BCRYPT_COST, SS_LOG\n"
}

pub fn version_line() -> String {
    format!("{SERVER_NAME} {SERVER_VERSION}")
}

fn parse_storage_dir(
    args: &[String],
    env: &impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, ConfigError> {
    Ok(flag_or_env(args, "--storage-dir", "SS_STORAGE_DIR", env)?
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)))
}

fn parse_port(
    args: &[String],
    env: &impl Fn(&str) -> Option<String>,
) -> Result<u16, ConfigError> {
    let Some(raw) = flag_or_env(args, "--port", "SS_PORT", env)? else {
        return Ok(DEFAULT_PORT);
    };
    raw.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort(raw))
}

fn parse_bcrypt_cost(
    args: &[String],
    env: &impl Fn(&str) -> Option<String>,
) -> Result<u32, ConfigError> {
    let Some(raw) = flag_or_env(args, "--bcrypt-cost", "SS_BCRYPT_COST", env)? else {
        return Ok(DEFAULT_BCRYPT_COST);
    };
    let cost = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidBcryptCost(raw))?;
    Ok(cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST))
}

fn flag_or_env(
    args: &[String],
    flag: &'static str,
    env_key: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Option<String>, ConfigError> {
    if let Some(value) = flag_value(args, flag)? {
        return Ok(Some(value));
    }
    Ok(env(env_key).filter(|value| !value.trim().is_empty()))
}

/// Accepts both `--flag value` and `--flag=value`; the last occurrence wins.
fn flag_value(args: &[String], flag: &'static str) -> Result<Option<String>, ConfigError> {
    let mut out = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            let Some(value) = iter.next() else {
                return Err(ConfigError::MissingValue(flag));
            };
            out = Some(value.clone());
        } else if let Some(value) = arg
            .strip_prefix(flag)
            .and_then(|rest| rest.strip_prefix('='))
        {
            out = Some(value.to_string());
        }
    }
    Ok(out)
}
