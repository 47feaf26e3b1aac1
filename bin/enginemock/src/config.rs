//! Config loading: the optional TOML file plus `key.path=value` overrides.

use std::{fs, path::Path};

use enginemock_config::Config;
use toml::{value::Table, Value};

use crate::{
    args::Args,
    errors::{ConfigError, InitError},
};

/// Loads the config file (or an empty table when none is given), applies every override from
/// `args` in order and deserializes the result. Absent sections and keys take their defaults.
pub(crate) fn get_config(args: &Args) -> Result<Config, InitError> {
    let mut config_toml = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => Value::Table(Table::new()),
    };

    let overrides = args
        .get_all_overrides()
        .iter()
        .map(|o| parse_override(o))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let table = config_toml
        .as_table_mut()
        .ok_or(ConfigError::TraverseNonTableAt {
            key: "<root>".to_string(),
            path: "".to_string(),
        })?;

    for (path, val) in overrides {
        apply_override(&path, val, table)?;
    }

    let config = config_toml.try_into::<Config>()?;
    Ok(config)
}

fn load_config_from_path(path: &Path) -> Result<Value, InitError> {
    let config_str = fs::read_to_string(path)?;
    Ok(toml::from_str(&config_str)?)
}

/// Splits `key.path=value`. The value is read as a TOML value when it parses as one and taken as a
/// plain string otherwise, so `-o rpc.http_addr=0.0.0.0:8551` needs no quoting.
pub(crate) fn parse_override(s: &str) -> Result<(String, Value), ConfigError> {
    let (path, raw) = s
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(s.to_string()))?;

    let path = path.trim();
    if path.is_empty() {
        return Err(ConfigError::InvalidOverride(s.to_string()));
    }

    Ok((path.to_string(), parse_value(raw.trim())))
}

fn parse_value(raw: &str) -> Value {
    toml::from_str::<Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Sets `val` at the dotted `path` inside `table`, creating intermediate tables as needed.
pub(crate) fn apply_override(path: &str, val: Value, table: &mut Table) -> Result<(), ConfigError> {
    let mut keys = path.split('.').peekable();
    let mut current = table;

    while let Some(key) = keys.next() {
        if key.is_empty() {
            return Err(ConfigError::MissingKey(path.to_string()));
        }

        if keys.peek().is_none() {
            current.insert(key.to_string(), val);
            return Ok(());
        }

        current = current
            .entry(key.to_string())
            .or_insert(Value::Table(Table::new()))
            .as_table_mut()
            .ok_or_else(|| ConfigError::TraverseNonTableAt {
                key: key.to_string(),
                path: path.to_string(),
            })?;
    }

    Ok(())
}
