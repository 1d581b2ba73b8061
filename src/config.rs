//! Daemon configuration.
//!
//! Loaded from an optional config file (TOML/JSON/YAML via the `config`
//! crate) layered with `NDND_`-prefixed environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

fn default_cost() -> u32 {
    10
}

/// A static route applied at startup: the daemon dials `nexthop` and
/// installs it as the next-hop for `prefix`.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub prefix: String,
    /// Face URI of the upstream router or producer.
    pub nexthop: String,
    #[serde(default = "default_cost")]
    pub cost: u32,
}

/// A strategy-choice entry applied at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    pub prefix: String,
    /// Short name ("weighted-load-balancer") or full strategy Name.
    pub strategy: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Face URIs to listen on.
    pub listen: Vec<String>,
    pub routes: Vec<RouteConfig>,
    pub strategies: Vec<StrategyConfig>,
    pub cs_capacity: usize,
    pub pit_capacity: usize,
    pub admit_unsolicited: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: vec![
                "tcp4://0.0.0.0:6363".to_string(),
                "udp4://0.0.0.0:6363".to_string(),
            ],
            routes: Vec::new(),
            strategies: Vec::new(),
            cs_capacity: 65536,
            pit_capacity: 65536,
            admit_unsolicited: false,
        }
    }
}

impl DaemonConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("NDND").separator("__"),
        );
        builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }
}
