use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fmt, str::FromStr, time::Duration};

use crate::{
    error::{Error, FtpResult},
    protocol::DEFAULT_PORT,
};

const DEFAULT_CONNECT_TIMEOUT: u64 = 60;
const DEFAULT_MAX_IDLE: usize = 8;
const DEFAULT_IDLE_TIMEOUT: u64 = 60;

/// Named string values per profile, owned by the host application.
pub trait ConfigStore {
    fn get(&self, profile: &str, key: &str) -> Option<String>;
}

impl ConfigStore for HashMap<String, HashMap<String, String>> {
    fn get(&self, profile: &str, key: &str) -> Option<String> {
        HashMap::get(self, profile)?.get(key).cloned()
    }
}

/// Connection settings for one FTP remote.
///
/// `pass` is expected in plaintext, revealing an obscured password is up to
/// the caller.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub pass: String,
    /// Seconds allowed for connecting and logging in
    pub connect_timeout: u64,
    /// Healthy connections kept around for reuse
    pub max_idle: usize,
    /// Seconds an idle connection may wait in the pool
    pub idle_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: None,
            port: None,
            pass: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_idle: DEFAULT_MAX_IDLE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

fn parse<T: FromStr>(key: &str, value: Option<String>) -> FtpResult<Option<T>> {
    match value.filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} {v:?} is not a valid number"))),
    }
}

impl Config {
    pub fn new<H: Into<String>>(host: H) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Resolves the settings stored for `profile`.
    pub fn from_store<S: ConfigStore + ?Sized>(store: &S, profile: &str) -> FtpResult<Self> {
        let get = |key: &str| store.get(profile, key);

        let host = get("host")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Config(format!("{profile}: host is required")))?;

        let mut config = Self::new(host);
        config.user = get("user").filter(|u| !u.is_empty());
        config.port = parse("port", get("port"))?;
        config.pass = get("pass").unwrap_or_default();

        if let Some(secs) = parse("connect_timeout", get("connect_timeout"))? {
            config.connect_timeout = secs;
        }
        if let Some(max) = parse("max_idle", get("max_idle"))? {
            config.max_idle = max;
        }
        if let Some(secs) = parse("idle_timeout", get("idle_timeout"))? {
            config.idle_timeout = secs;
        }

        Ok(config)
    }

    /// The configured user, else the invoking user, else `anonymous`.
    pub fn user(&self) -> String {
        self.user
            .clone()
            .or_else(|| env::var("USER").ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| "anonymous".to_owned())
    }

    pub fn dial_addr(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(DEFAULT_PORT))
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            addr: self.dial_addr(),
            user: self.user(),
            pass: self.pass.clone(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_idle", &self.max_idle)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

/// Where and as whom a filesystem connects. Two filesystems with equal
/// endpoints talk to the same remote with the same rights.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: String,
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("addr", &self.addr)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
