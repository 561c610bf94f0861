//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{load_config, ConfigError, ProxyConfig};

#[derive(Parser, Debug)]
#[command(name = "filtering-proxy")]
#[command(about = "Forwarding HTTP proxy that blocks hosts, censors words and caches responses", long_about = None)]
pub struct Cli {
    /// Port to listen on.
    pub port: u16,

    /// File with one blocked hostname per line.
    pub blocklist: PathBuf,

    /// File with one censored word per line.
    pub words: PathBuf,

    /// Directory for cached responses.
    pub cache_dir: PathBuf,

    /// Optional TOML file with further settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The effective configuration: file (or defaults) with positionals on top.
    pub fn resolve_config(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };
        config.listener.port = self.port;
        config.files.blocklist = self.blocklist.clone();
        config.files.words = self.words.clone();
        config.files.cache_dir = self.cache_dir.clone();
        Ok(config)
    }
}
