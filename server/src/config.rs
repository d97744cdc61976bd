//! # Server configuration
//!
//! Read once at startup from environment variables. See [`vars`] for the variable names and
//! [`defaults`] for the values used when optional ones are unset.

use std::{
    ffi::OsString,
    fmt::Display,
    net::SocketAddr,
    path::PathBuf,
    str::FromStr,
};

use tracing::info;

/// Names of the environment variables read by [`ServerConfig::from_env()`].
pub mod vars {
    pub const DB_PATH: &str = "DB_PATH";
    pub const UPLOAD_DIR: &str = "UPLOAD_DIR";
    pub const LISTEN_ADDR: &str = "LISTEN_ADDR";
    pub const MAX_UPLOAD_BYTES: &str = "MAX_UPLOAD_BYTES";
}

pub mod defaults {
    pub const UPLOAD_DIR: &str = "./uploads";
    pub const LISTEN_ADDR: &str = "0.0.0.0:3000";
    /// 10 MiB
    pub const MAX_UPLOAD_BYTES: &str = "10485760";
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    MissingEnv(&'static str),

    #[error("environment variable {0} is not valid UTF-8")]
    EnvNotUtf8(&'static str),

    #[error("invalid value for {var}: {source}")]
    Invalid {
        var: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// SQLite database file, created if missing
    pub db_path: PathBuf,
    /// Directory receiving uploaded files
    pub upload_dir: PathBuf,
    pub listen_addr: SocketAddr,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var_os(var))
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let db_path = lookup(vars::DB_PATH)
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingEnv(vars::DB_PATH))?;
        let upload_dir = lookup(vars::UPLOAD_DIR).map_or_else(
            || {
                info!("{} not set, using default: {}", vars::UPLOAD_DIR, defaults::UPLOAD_DIR);
                PathBuf::from(defaults::UPLOAD_DIR)
            },
            PathBuf::from,
        );

        Ok(Self {
            db_path,
            upload_dir,
            listen_addr: parse_var(&lookup, vars::LISTEN_ADDR, defaults::LISTEN_ADDR)?,
            max_upload_bytes: parse_var(
                &lookup,
                vars::MAX_UPLOAD_BYTES,
                defaults::MAX_UPLOAD_BYTES,
            )?,
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<OsString>,
{
    let value = match lookup(var) {
        Some(value) => value
            .into_string()
            .map_err(|_| ConfigError::EnvNotUtf8(var))?,
        None => {
            info!("{var} not set, using default: {default}");
            default.to_owned()
        }
    };
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        source: Box::new(e),
    })
}

impl Display for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "database {}, uploads in {}, listening on {}, body limit {} bytes",
            self.db_path.display(),
            self.upload_dir.display(),
            self.listen_addr,
            self.max_upload_bytes
        )
    }
}
