use std::collections::HashMap;
use std::path::Path;

use eyre::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::Value,
    Figment,
};
use serde::{Deserialize, Serialize};

/// snapsafe configuration, merged from (lowest to highest precedence) the
/// built-in defaults, a TOML config file, `SNAPSAFE_`-prefixed environment
/// variables and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint of the chain hosting the Safe and its module.
    pub rpc_url: String,
    /// Base URL of the proposal metadata service.
    pub hub_url: String,
    /// Chain the module contract lives on.
    pub chain_id: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            hub_url: "https://hub.snapshot.org".to_string(),
            chain_id: 1,
        }
    }
}

impl Config {
    pub fn new(
        config_path: &Path,
        cli_provider: Serialized<HashMap<&'static str, Value>>,
    ) -> Result<Self> {
        let config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SNAPSAFE_"))
            .merge(cli_provider)
            .extract()?;
        Ok(config)
    }
}
