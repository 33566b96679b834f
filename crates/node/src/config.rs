use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use strata_crypto::PrivateKey;

use crate::NodeError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Peers dialed at startup.
    #[serde(default)]
    pub bootstrap: Vec<String>,
    /// Hex seed of the validator key. Nodes without one never run the validator loop.
    #[serde(default)]
    pub validator_seed: Option<String>,
    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
}

fn default_version() -> String {
    "strata-01".into()
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".into()
}

fn default_block_time_ms() -> u64 {
    5_000
}

fn default_rpc_timeout_ms() -> u64 {
    5_000
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            listen_addr: default_listen_addr(),
            bootstrap: Vec::new(),
            validator_seed: None,
            block_time_ms: default_block_time_ms(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
        }
    }
}

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let text = fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("unable to read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, NodeError> {
        toml::from_str(text).map_err(|e| NodeError::Config(format!("unable to parse config: {e}")))
    }

    pub fn block_time(&self) -> Duration {
        Duration::from_millis(self.block_time_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn validator_key(&self) -> Result<Option<PrivateKey>, NodeError> {
        self.validator_seed
            .as_deref()
            .map(PrivateKey::from_seed_hex)
            .transpose()
            .map_err(NodeError::from)
    }
}
