//! Command line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{load_config, ConfigError, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "origin-relay", version)]
#[command(about = "Relay every request on a local port to a single upstream origin", long_about = None)]
pub struct Cli {
    /// Listen TCP port number [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log request and response traces
    #[arg(short, long)]
    pub debug: bool,

    /// TOML configuration file used as the base configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Upstream URL; path, query and fragment are ignored [default: http://localhost:8000/]
    #[arg(value_name = "URL")]
    pub url: Option<String>,
}

impl Cli {
    /// Build the effective configuration: file (or defaults), then flags.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if self.debug {
            config.debug_logging = true;
        }
        if let Some(url) = self.url {
            config.upstream.address = url;
        }

        Ok(config)
    }
}
