//! Configuration for the blog server
//!
//! Settings are layered, later layers overriding earlier ones:
//! built-in defaults, an optional config file, `BLOG_`-prefixed environment
//! variables, `EASERV_PORT`, and finally command-line flags.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{Result, ServerError};

/// Legacy listen address variable, e.g. `:8080`
pub const LEGACY_PORT_VAR: &str = "EASERV_PORT";

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Blog posts and comments over HTTP")]
pub struct Args {
    /// Config file path (TOML, JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level or filter directive, e.g. `debug` or `blogstore_core=debug`
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Log level or filter directive
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Load configuration from every layer, reading the process environment
    pub fn load(args: &Args) -> Result<Self> {
        Self::from_sources(args, None)
    }

    /// Load configuration, reading environment variables from `env` instead
    /// of the process environment when given
    pub fn from_sources(args: &Args, env: Option<HashMap<String, String>>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "text")?;

        if let Some(path) = &args.config {
            builder = builder.add_source(File::from(path.clone()).required(true));
        }

        let legacy = match &env {
            Some(vars) => vars.get(LEGACY_PORT_VAR).cloned(),
            None => std::env::var(LEGACY_PORT_VAR).ok(),
        };
        builder = builder.add_source(Environment::with_prefix("BLOG").source(env));

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;

        if let Some(value) = legacy {
            let (host, port) = parse_legacy_addr(&value)?;
            if let Some(host) = host {
                config.host = host;
            }
            config.port = port;
        }

        config.apply_args(args);
        Ok(config)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
        if let Some(format) = args.log_format {
            self.log_format = format;
        }
    }

    /// Socket address to bind
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Address(format!("{}:{}: {}", self.host, self.port, e)))
    }
}

/// Parse `:8080`, `8080` or `host:8080`
fn parse_legacy_addr(value: &str) -> Result<(Option<String>, u16)> {
    let (host, port) = match value.rsplit_once(':') {
        Some((host, port)) => (Some(host).filter(|h| !h.is_empty()), port),
        None => (None, value),
    };

    let port = port
        .parse()
        .map_err(|_| ServerError::Address(format!("{}={}", LEGACY_PORT_VAR, value)))?;
    Ok((host.map(str::to_string), port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_sources(&Args::default(), env(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.listen_addr().unwrap(), "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn test_file_then_env_then_args() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 9000\nlog_level = \"debug\"\nlog_format = \"json\"").unwrap();

        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = ServerConfig::from_sources(&args, env(&[])).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);

        let config = ServerConfig::from_sources(&args, env(&[("BLOG_PORT", "9100")])).unwrap();
        assert_eq!(config.port, 9100);

        let args = Args {
            port: Some(9200),
            host: Some("127.0.0.1".to_string()),
            ..args
        };
        let config = ServerConfig::from_sources(&args, env(&[("BLOG_PORT", "9100")])).unwrap();
        assert_eq!(config.port, 9200);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/blog.toml")),
            ..Default::default()
        };
        assert!(matches!(
            ServerConfig::from_sources(&args, env(&[])),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn test_legacy_port_variable() {
        let config = ServerConfig::from_sources(&Args::default(), env(&[("EASERV_PORT", ":8181")])).unwrap();
        assert_eq!(config.port, 8181);
        assert_eq!(config.host, "0.0.0.0");

        let args = Args {
            port: Some(8282),
            ..Default::default()
        };
        let config = ServerConfig::from_sources(&args, env(&[("EASERV_PORT", ":8181")])).unwrap();
        assert_eq!(config.port, 8282);

        let err = ServerConfig::from_sources(&Args::default(), env(&[("EASERV_PORT", "http")]));
        assert!(matches!(err, Err(ServerError::Address(_))));
    }

    #[rstest]
    #[case::colon_port(":8080", None, 8080)]
    #[case::bare_port("8080", None, 8080)]
    #[case::host_and_port("127.0.0.1:9000", Some("127.0.0.1"), 9000)]
    fn test_parse_legacy_addr(#[case] value: &str, #[case] host: Option<&str>, #[case] port: u16) {
        let (actual_host, actual_port) = parse_legacy_addr(value).unwrap();
        assert_eq!(actual_host.as_deref(), host);
        assert_eq!(actual_port, port);
    }
}
