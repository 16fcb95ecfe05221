//! Start-up configuration.
//!
//! Every setting comes from a `CLASSFORGE_*` environment variable and falls
//! back to a default suitable for local development. Values are validated
//! once, before the server binds, so a typo in a prefix fails fast instead of
//! producing invalid identifiers later.

use crate::engine::generator::{is_valid_identifier, MAX_LIST_SIZE};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got `{value}`")]
    NotANumber { var: &'static str, value: String },
    #[error("{var} must be between {min} and {max}, got {value}")]
    OutOfRange {
        var: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
    #[error("{var} must be a CSS identifier start, got `{value}`")]
    InvalidPrefix { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    /// Maximum JSON body size in bytes.
    pub json_limit: usize,
    pub template_prefix: String,
    pub list_prefix: String,
    pub default_list_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: PathBuf::from("classforge.sqlite"),
            json_limit: 10 * 1024 * 1024, // 10 MB
            template_prefix: "tpl".to_string(),
            list_prefix: "cls".to_string(),
            default_list_size: 20,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let port = match get("CLASSFORGE_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::NotANumber {
                var: "CLASSFORGE_PORT",
                value,
            })?,
            None => defaults.port,
        };
        let json_limit = number(get("CLASSFORGE_JSON_LIMIT"), "CLASSFORGE_JSON_LIMIT")?
            .unwrap_or(defaults.json_limit);
        let default_list_size =
            number(get("CLASSFORGE_DEFAULT_LIST_SIZE"), "CLASSFORGE_DEFAULT_LIST_SIZE")?
                .unwrap_or(defaults.default_list_size);
        if default_list_size == 0 || default_list_size > MAX_LIST_SIZE {
            return Err(ConfigError::OutOfRange {
                var: "CLASSFORGE_DEFAULT_LIST_SIZE",
                value: default_list_size,
                min: 1,
                max: MAX_LIST_SIZE,
            });
        }

        Ok(Self {
            host: get("CLASSFORGE_HOST").unwrap_or(defaults.host),
            port,
            database: get("CLASSFORGE_DATABASE")
                .map(PathBuf::from)
                .unwrap_or(defaults.database),
            json_limit,
            template_prefix: prefix(
                get("CLASSFORGE_TEMPLATE_PREFIX"),
                "CLASSFORGE_TEMPLATE_PREFIX",
                defaults.template_prefix,
            )?,
            list_prefix: prefix(
                get("CLASSFORGE_LIST_PREFIX"),
                "CLASSFORGE_LIST_PREFIX",
                defaults.list_prefix,
            )?,
            default_list_size,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn number(value: Option<String>, var: &'static str) -> Result<Option<usize>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::NotANumber { var, value })
        })
        .transpose()
}

fn prefix(value: Option<String>, var: &'static str, default: String) -> Result<String, ConfigError> {
    match value {
        Some(value) if is_valid_identifier(value.trim()) => Ok(value.trim().to_string()),
        Some(value) => Err(ConfigError::InvalidPrefix { var, value }),
        None => Ok(default),
    }
}
