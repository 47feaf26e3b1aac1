//! CLI argument parsing.

use std::path::{Path, PathBuf};

use argh::FromArgs;
use toml::Value;

#[derive(Clone, Debug, Default, FromArgs)]
#[argh(description = "Mock Ethereum Engine API execution engine")]
pub(crate) struct Args {
    // Config non-overriding args
    #[argh(option, short = 'c', description = "path to configuration")]
    pub config: Option<PathBuf>,

    // Config overriding args
    /// Genesis file path that will override the path in the config toml.
    #[argh(option, description = "genesis json path")]
    pub genesis: Option<PathBuf>,

    /// Path of the hex encoded secret shared with the consensus client.
    #[argh(option, description = "jwt secret path")]
    pub jwt_secret: Option<PathBuf>,

    #[argh(option, description = "http rpc listen address")]
    pub listen_addr: Option<String>,

    #[argh(option, description = "websocket rpc listen address")]
    pub ws_addr: Option<String>,

    /// Allowed cross-origin callers. Replaces the configured list when given at least once.
    #[argh(option, description = "allowed cors origin, repeatable")]
    pub cors: Vec<String>,

    /// Other generic overrides to the config toml.
    /// Will be used, for example, as `-o rpc.timeouts.idle_ms=0 -o logging.json_format=true`
    #[argh(option, short = 'o', description = "generic config overrides")]
    pub overrides: Vec<String>,
}

impl Args {
    /// Get strings of overrides gathered from args, dedicated flags first.
    pub(crate) fn get_all_overrides(&self) -> Vec<String> {
        let mut overrides = self.get_internal_overrides();
        overrides.extend_from_slice(&self.overrides);
        overrides
    }

    /// Overrides derived from the dedicated flags. Values are rendered as TOML so paths and
    /// addresses are never reinterpreted as numbers or booleans.
    fn get_internal_overrides(&self) -> Vec<String> {
        let mut overrides = Vec::new();

        if let Some(genesis) = &self.genesis {
            overrides.push(format!("chain.genesis_path={}", path_value(genesis)));
        }
        if let Some(secret) = &self.jwt_secret {
            overrides.push(format!("chain.jwt_secret_path={}", path_value(secret)));
        }
        if let Some(addr) = &self.listen_addr {
            overrides.push(format!("rpc.http_addr={}", Value::String(addr.clone())));
        }
        if let Some(addr) = &self.ws_addr {
            overrides.push(format!("rpc.ws_addr={}", Value::String(addr.clone())));
        }
        if !self.cors.is_empty() {
            let origins = self.cors.iter().cloned().map(Value::String).collect();
            overrides.push(format!("rpc.cors={}", Value::Array(origins)));
        }

        overrides
    }
}

fn path_value(path: &Path) -> Value {
    Value::String(path.display().to_string())
}
