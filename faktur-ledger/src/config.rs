//! Configuration for the ledger node and wallet

use serde::{Deserialize, Serialize};

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Node HTTP listen address
    pub listen_addr: String,

    /// Wallet HTTP listen address
    pub wallet_listen_addr: String,

    /// Proof-of-work configuration
    pub mining: MiningConfig,

    /// Peer reconciliation configuration
    pub consensus: ConsensusConfig,

    /// Ledger actor configuration
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "faktur-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            listen_addr: "127.0.0.1:5001".to_string(),
            wallet_listen_addr: "127.0.0.1:8081".to_string(),
            mining: MiningConfig::default(),
            consensus: ConsensusConfig::default(),
            actor: ActorConfig::default(),
        }
    }
}

/// Proof-of-work configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Leading zero hex characters required in the proof hash.
    /// Must be identical on every node of the network.
    pub difficulty: usize,

    /// RSA modulus size for wallet-generated keys
    pub key_bits: usize,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            difficulty: crate::pow::DEFAULT_DIFFICULTY,
            key_bits: 1024,
        }
    }
}

/// Peer reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Per-peer fetch timeout (milliseconds)
    pub peer_timeout_ms: u64,

    /// Peers registered at startup (`host:port`)
    pub peers: Vec<String>,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            peer_timeout_ms: 5_000,
            peers: Vec::new(),
        }
    }
}

/// Ledger actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    ///
    /// `FAKTUR_CONFIG` names an optional TOML file applied before the
    /// individual variable overrides.
    pub fn from_env() -> crate::Result<Self> {
        let mut config = match std::env::var("FAKTUR_CONFIG") {
            Ok(path) => Config::from_file(path)?,
            Err(_) => Config::default(),
        };

        if let Ok(addr) = std::env::var("FAKTUR_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(addr) = std::env::var("FAKTUR_WALLET_ADDR") {
            config.wallet_listen_addr = addr;
        }

        if let Ok(difficulty) = std::env::var("FAKTUR_DIFFICULTY") {
            config.mining.difficulty = difficulty.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid FAKTUR_DIFFICULTY: {}", e))
            })?;
        }

        if let Ok(timeout) = std::env::var("FAKTUR_PEER_TIMEOUT_MS") {
            config.consensus.peer_timeout_ms = timeout.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid FAKTUR_PEER_TIMEOUT_MS: {}", e))
            })?;
        }

        if let Ok(peers) = std::env::var("FAKTUR_PEERS") {
            config.consensus.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the node cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        // A sha256 hex digest has 64 characters.
        if self.mining.difficulty > 64 {
            return Err(crate::Error::Config(
                "Difficulty cannot exceed 64 hex characters".to_string(),
            ));
        }

        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "Actor mailbox capacity must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
