use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    path::PathBuf,
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Default value for `http_addr` in [`RpcConfig`].
const DEFAULT_HTTP_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8551));

/// Default value for `ws_addr` in [`RpcConfig`].
const DEFAULT_WS_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8552));

const DEFAULT_READ_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_READ_HEADER_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_WRITE_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_IDLE_TIMEOUT_MS: u64 = 300_000;

const DEFAULT_GENESIS_PATH: &str = "genesis.json";
const DEFAULT_JWT_SECRET_PATH: &str = "jwt.hex";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Address of the plain HTTP JSON-RPC listener.
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,

    /// Address of the WebSocket JSON-RPC listener.
    #[serde(default = "default_ws_addr")]
    pub ws_addr: SocketAddr,

    /// Allowed cross-origin callers. `["*"]` allows any origin.
    #[serde(default = "default_cors")]
    pub cors: Vec<String>,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR,
            ws_addr: DEFAULT_WS_ADDR,
            cors: default_cors(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Per-listener timeouts, in milliseconds. A value of 0 disables the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Time allowed to receive a whole request.
    #[serde(default = "default_read_timeout_ms")]
    pub read_ms: u64,

    /// Time allowed to receive request headers.
    #[serde(default = "default_read_header_timeout_ms")]
    pub read_header_ms: u64,

    /// Time allowed to produce and send a response.
    #[serde(default = "default_write_timeout_ms")]
    pub write_ms: u64,

    /// How long a connection may stay open without any request.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_ms: DEFAULT_READ_TIMEOUT_MS,
            read_header_ms: DEFAULT_READ_HEADER_TIMEOUT_MS,
            write_ms: DEFAULT_WRITE_TIMEOUT_MS,
            idle_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl TimeoutConfig {
    pub fn read(&self) -> Option<Duration> {
        millis(self.read_ms)
    }

    pub fn read_header(&self) -> Option<Duration> {
        millis(self.read_header_ms)
    }

    pub fn write(&self) -> Option<Duration> {
        millis(self.write_ms)
    }

    pub fn idle(&self) -> Option<Duration> {
        millis(self.idle_ms)
    }

    /// Deadline for serving a single request, covering both reading it and writing the response.
    pub fn request_deadline(&self) -> Option<Duration> {
        match (self.read(), self.write()) {
            (Some(read), Some(write)) => Some(read + write),
            (Some(one), None) | (None, Some(one)) => Some(one),
            (None, None) => None,
        }
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Geth-style genesis JSON the mock chain is seeded from.
    #[serde(default = "default_genesis_path")]
    pub genesis_path: PathBuf,

    /// File holding the hex encoded 32 byte JWT secret.
    #[serde(default = "default_jwt_secret_path")]
    pub jwt_secret_path: PathBuf,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_path: default_genesis_path(),
            jwt_secret_path: default_jwt_secret_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub chain: ChainConfig,

    /// Logging configuration (optional section in TOML).
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_http_addr() -> SocketAddr {
    DEFAULT_HTTP_ADDR
}

fn default_ws_addr() -> SocketAddr {
    DEFAULT_WS_ADDR
}

fn default_cors() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_read_header_timeout_ms() -> u64 {
    DEFAULT_READ_HEADER_TIMEOUT_MS
}

fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT_MS
}

fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT_MS
}

fn default_genesis_path() -> PathBuf {
    DEFAULT_GENESIS_PATH.into()
}

fn default_jwt_secret_path() -> PathBuf {
    DEFAULT_JWT_SECRET_PATH.into()
}
