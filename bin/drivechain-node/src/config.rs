//! Config loading: TOML file, then `section.key=value` overrides, then deserialization.

use std::{fs, path::Path};

use drivechain_config::Config;
use toml::{value::Table, Value};

use crate::{args::Args, errors::*};

pub(crate) fn get_config(args: &Args) -> Result<Config, InitError> {
    let mut config_toml = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => Value::Table(Table::new()),
    };

    let overrides = args
        .get_all_overrides()?
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

    Ok(config_toml.try_into::<Config>()?)
}

fn load_config_from_path(path: &Path) -> Result<Value, InitError> {
    let config_str = fs::read_to_string(path)?;
    Ok(toml::from_str(&config_str)?)
}

/// Splits `a.b.c=value` into the key path and a TOML value. Values that do not parse
/// as TOML scalars are taken as strings.
pub(crate) fn parse_override(s: &str) -> Result<(Vec<String>, Value), ConfigError> {
    let (path, raw) = s
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(s.to_owned()))?;
    let path = path.trim();
    if path.is_empty() || path.split('.').any(|p| p.trim().is_empty()) {
        return Err(ConfigError::InvalidOverride(s.to_owned()));
    }
    let keys = path.split('.').map(|p| p.trim().to_owned()).collect();
    Ok((keys, parse_value(raw.trim())))
}

fn parse_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::String(raw.to_owned())
}

/// Sets `path` in `table`, creating intermediate tables as needed.
pub(crate) fn apply_override(
    path: &[String],
    val: Value,
    table: &mut Table,
) -> Result<(), ConfigError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(ConfigError::InvalidOverride(String::new()));
    };

    let mut cur = table;
    for (i, key) in parents.iter().enumerate() {
        let entry = cur
            .entry(key.clone())
            .or_insert_with(|| Value::Table(Table::new()));
        cur = entry
            .as_table_mut()
            .ok_or_else(|| ConfigError::TraverseNonTableAt {
                key: key.clone(),
                path: path[..=i].join("."),
            })?;
    }
    cur.insert(last.clone(), val);
    Ok(())
}
