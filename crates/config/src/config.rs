use std::path::PathBuf;

use bitcoin::Network;
use drivechain_scdb_types::DefaultVotePolicy;
use serde::{Deserialize, Serialize};

const DEFAULT_RPC_HOST: &str = "127.0.0.1";

/// Regtest RPC port of the base chain node.
const DEFAULT_RPC_PORT: u16 = 18443;

const DEFAULT_DATADIR: &str = "drivechain-data";

const DEFAULT_DB_RETRY_DELAY: u64 = 150;

const DEFAULT_DB_RETRY_COUNT: u16 = 3;

/// Regtest halving interval.
const DEFAULT_SUBSIDY_HALVING_INTERVAL: u64 = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Addr that the rpc server will listen to.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port that the rpc server will listen to.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Root of the sled database.
    #[serde(default = "default_datadir")]
    pub datadir: PathBuf,

    /// How many times to retry a conflicting sled transaction.
    #[serde(default = "default_db_retry_count")]
    pub db_retry_count: u16,

    /// Pause between transaction retries, in milliseconds.
    #[serde(default = "default_db_retry_delay")]
    pub db_retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            datadir: default_datadir(),
            db_retry_count: default_db_retry_count(),
            db_retry_delay_ms: default_db_retry_delay(),
        }
    }
}

fn default_rpc_host() -> String {
    DEFAULT_RPC_HOST.to_owned()
}

fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_datadir() -> PathBuf {
    DEFAULT_DATADIR.into()
}

fn default_db_retry_count() -> u16 {
    DEFAULT_DB_RETRY_COUNT
}

fn default_db_retry_delay() -> u64 {
    DEFAULT_DB_RETRY_DELAY
}

fn default_subsidy_halving_interval() -> u64 {
    DEFAULT_SUBSIDY_HALVING_INTERVAL
}

fn default_network() -> Network {
    Network::Regtest
}

/// Consensus-side knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScdbConfig {
    /// How WT^s are voted on when neither the block nor the operator says otherwise.
    #[serde(default)]
    pub default_vote_policy: DefaultVotePolicy,

    /// Blocks between subsidy halvings, used by `getaveragefee`.
    #[serde(default = "default_subsidy_halving_interval")]
    pub subsidy_halving_interval: u64,

    /// Network used when deriving sidechain keys and rendering addresses.
    #[serde(default = "default_network")]
    pub network: Network,
}

impl Default for ScdbConfig {
    fn default() -> Self {
        Self {
            default_vote_policy: DefaultVotePolicy::default(),
            subsidy_halving_interval: default_subsidy_halving_interval(),
            network: default_network(),
        }
    }
}

/// `[logging]` section. Stdout logging is always on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Enables daily rotated log files in this directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// JSON lines on every sink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub scdb: ScdbConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
