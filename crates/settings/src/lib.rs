//! Runtime settings for the inventory tooling.
//!
//! # Sample Config
//! ```yaml
//! logging:
//!   max_level: DEBUG
//!   log_file: ant-infra.log
//! ssh:
//!   default_user: vagrant
//!   default_port: 22
//!   connect_timeout_secs: 30
//! vagrant:
//!   binary: vagrant
//!   working_dir: /srv/ant/vagrant
//! static_hosts:
//!   slave1:
//!     host_string: vagrant@10.0.2.16:22
//!     ssh_key: /srv/ant/keys/slave1
//! ```
//!
//! Every key can be overridden from the environment, e.g.
//! `ANT_SSH__DEFAULT_USER=root`.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;

pub use config::ConfigError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InfraSettings {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub vagrant: VagrantConfig,

    /// Fixed SSH coordinates for machines that are not managed by Vagrant.
    #[serde(default)]
    pub static_hosts: HashMap<String, StaticHostConfig>,

    /// Topology file used when none is given on the command line.
    #[serde(default)]
    pub topology: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggingLevel {
    ERROR,
    WARN,
    #[default]
    INFO,
    DEBUG,
    TRACE,
    OFF,
}

impl<'de> Deserialize<'de> for LoggingLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = String::deserialize(deserializer)?;

        Ok(match v.as_str() {
            "ERROR" => Self::ERROR,
            "WARN" => Self::WARN,
            "INFO" => Self::INFO,
            "DEBUG" => Self::DEBUG,
            "TRACE" => Self::TRACE,
            "OFF" => Self::OFF,
            other => Err(serde::de::Error::custom(format!(
                "Bad logging level specifier {other}"
            )))?,
        })
    }
}

impl From<LoggingLevel> for LevelFilter {
    fn from(value: LoggingLevel) -> Self {
        match value {
            LoggingLevel::ERROR => LevelFilter::ERROR,
            LoggingLevel::WARN => LevelFilter::WARN,
            LoggingLevel::INFO => LevelFilter::INFO,
            LoggingLevel::DEBUG => LevelFilter::DEBUG,
            LoggingLevel::TRACE => LevelFilter::TRACE,
            LoggingLevel::OFF => LevelFilter::OFF,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub max_level: LoggingLevel,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SshConfig {
    /// User for host strings that don't name one.
    #[serde(default = "SshConfig::default_user")]
    pub default_user: String,

    /// Port for host strings that don't name one.
    #[serde(default = "SshConfig::default_port")]
    pub default_port: u16,

    #[serde(default = "SshConfig::default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl SshConfig {
    fn default_user() -> String {
        "vagrant".to_owned()
    }

    fn default_port() -> u16 {
        22
    }

    fn default_connect_timeout() -> u64 {
        30
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            default_user: Self::default_user(),
            default_port: Self::default_port(),
            connect_timeout_secs: Self::default_connect_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VagrantConfig {
    #[serde(default = "VagrantConfig::default_binary")]
    pub binary: String,

    /// Directory holding the Vagrantfile. Defaults to the current directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl VagrantConfig {
    fn default_binary() -> String {
        "vagrant".to_owned()
    }
}

impl Default for VagrantConfig {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StaticHostConfig {
    pub host_string: String,
    pub ssh_key: PathBuf,
}

/// Reads settings from `path` (if given) and `ANT_*` environment variables.
pub fn load(path: Option<&Path>) -> Result<InfraSettings, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    builder
        .add_source(config::Environment::with_prefix("ANT").separator("__"))
        .build()?
        .try_deserialize()
}

static SETTINGS: OnceCell<InfraSettings> = OnceCell::new();

/// Loads the process-wide settings. Only the first call reads anything.
pub fn init(path: Option<&Path>) -> Result<&'static InfraSettings, ConfigError> {
    SETTINGS.get_or_try_init(|| {
        let settings = load(path)?;
        tracing::debug!("Loaded settings: {settings:?}");
        Ok(settings)
    })
}
