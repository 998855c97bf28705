//! Service configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults.
//! 2. The TOML file (`jules-relay.toml` unless `--config` says otherwise).
//! 3. Command-line flags and their environment variables.
//!
//! Slack secrets are read from the environment only. Everything is checked
//! in [`RelayConfig::validate`]; the service never starts on an invalid
//! configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use thiserror::Error;

use jules::JulesClientConfig;
use orchestrator::{PollPolicy, UserId};

pub const DEFAULT_CONFIG_PATH: &str = "jules-relay.toml";
pub const SLACK_BOT_TOKEN_ENV: &str = "SLACK_BOT_TOKEN";
pub const SLACK_SIGNING_SECRET_ENV: &str = "SLACK_SIGNING_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Command-line interface.
#[derive(Debug, Default, Parser)]
#[command(
    name = "jules-relay",
    version,
    about = "Starts Jules coding sessions from Slack and webhooks and reports the resulting pull requests"
)]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "JULES_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Socket address to listen on, e.g. 0.0.0.0:8080.
    #[arg(long, env = "JULES_RELAY_BIND")]
    pub bind: Option<String>,

    /// Credential store file. Without one, credentials live in memory.
    #[arg(long, env = "JULES_RELAY_STORE_PATH")]
    pub store_path: Option<PathBuf>,

    #[arg(long, env = "JULES_API_BASE")]
    pub jules_api_base: Option<String>,

    /// Bot user id; resolved through `auth.test` when unset.
    #[arg(long, env = "SLACK_BOT_USER_ID")]
    pub slack_bot_user_id: Option<String>,

    #[arg(long, env = "JULES_RELAY_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// OTLP gRPC endpoint for trace export.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub jules: JulesConfig,
    pub polling: PollingConfig,
    pub slack: SlackConfig,
    pub store: StoreConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JulesConfig {
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub starting_branch: String,
}

impl Default for JulesConfig {
    fn default() -> Self {
        Self {
            api_base: jules::DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 30,
            starting_branch: jules::DEFAULT_STARTING_BRANCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: PollPolicy::DEFAULT_INTERVAL.as_secs(),
            max_attempts: PollPolicy::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlackConfig {
    pub api_base: String,
    pub bot_user_id: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base: slack::DEFAULT_SLACK_API_BASE.to_string(),
            bot_user_id: None,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

/// Slack credentials taken from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct SlackSecrets {
    pub bot_token: String,
    pub signing_secret: String,
}

impl std::fmt::Debug for SlackSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackSecrets").finish_non_exhaustive()
    }
}

/// Validated, typed settings the service is built from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub jules: JulesClientConfig,
    pub poll_policy: PollPolicy,
    pub slack_api_base: String,
    pub slack_request_timeout: Duration,
    pub slack_bot_user_id: Option<UserId>,
    /// `None` disables the Slack endpoints.
    pub slack_secrets: Option<SlackSecrets>,
    pub store_path: Option<PathBuf>,
    pub telemetry: TelemetryConfig,
}

impl RelayConfig {
    /// Reads `path`. A missing file yields the defaults unless `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies command-line and environment overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(bind) = &args.bind {
            self.server.bind = bind.clone();
        }
        if let Some(path) = &args.store_path {
            self.store.path = Some(path.clone());
        }
        if let Some(api_base) = &args.jules_api_base {
            self.jules.api_base = api_base.clone();
        }
        if let Some(bot_user_id) = &args.slack_bot_user_id {
            self.slack.bot_user_id = Some(bot_user_id.clone());
        }
        if let Some(format) = args.log_format {
            self.telemetry.log_format = format;
        }
        if let Some(endpoint) = &args.otlp_endpoint {
            self.telemetry.otlp_endpoint = Some(endpoint.clone());
        }
    }

    /// Checks every value and resolves the Slack secrets through `env`.
    pub fn validate(
        self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, ConfigError> {
        let bind = self.server.bind.trim().parse::<SocketAddr>().map_err(|_| {
            ConfigError::Invalid(format!("server.bind `{}` is not a socket address", self.server.bind))
        })?;
        if self.polling.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "polling.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_secs must be at least 1".to_string(),
            ));
        }
        if self.jules.request_timeout_secs == 0 || self.slack.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request timeouts must be at least 1 second".to_string(),
            ));
        }
        for (key, value) in [
            ("jules.api_base", &self.jules.api_base),
            ("slack.api_base", &self.slack.api_base),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!("{key} must be an http(s) URL")));
            }
        }
        if self.jules.starting_branch.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "jules.starting_branch must not be empty".to_string(),
            ));
        }

        let secret = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let slack_secrets = match (secret(SLACK_BOT_TOKEN_ENV), secret(SLACK_SIGNING_SECRET_ENV)) {
            (Some(bot_token), Some(signing_secret)) => Some(SlackSecrets {
                bot_token,
                signing_secret,
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "{SLACK_BOT_TOKEN_ENV} and {SLACK_SIGNING_SECRET_ENV} must be set together"
                )))
            }
        };

        Ok(Settings {
            bind,
            jules: JulesClientConfig {
                api_base: self.jules.api_base,
                request_timeout: Duration::from_secs(self.jules.request_timeout_secs),
                starting_branch: self.jules.starting_branch,
            },
            poll_policy: PollPolicy::new(
                Duration::from_secs(self.polling.interval_secs),
                self.polling.max_attempts,
            ),
            slack_api_base: self.slack.api_base,
            slack_request_timeout: Duration::from_secs(self.slack.request_timeout_secs),
            slack_bot_user_id: self
                .slack
                .bot_user_id
                .and_then(|id| UserId::new(id.trim())),
            slack_secrets,
            store_path: self.store.path,
            telemetry: self.telemetry,
        })
    }
}

/// Loads, overrides and validates the configuration for `args`.
pub fn load_settings(args: &Args) -> Result<Settings, ConfigError> {
    let (path, required) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let mut config = RelayConfig::load(&path, required)?;
    config.apply_args(args);
    config.validate(|name| std::env::var(name).ok())
}
