use crate::error::{ReadflowError, Result};
use crate::types::config::ReadflowConfig;
use std::path::{Path, PathBuf};
use toml::map::Map;
use toml::Value;

pub const DEFAULT_CONFIG_FILE: &str = "readflow.toml";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/readflow/config.toml";

/// Loads the global config, `./readflow.toml`, then `explicit`, later layers
/// overriding earlier ones key by key. Missing optional layers are skipped;
/// a missing `explicit` file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<ReadflowConfig> {
    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    let local = std::env::current_dir()?.join(DEFAULT_CONFIG_FILE);
    load_config_layers(global.as_deref(), Some(&local), explicit)
}

pub(crate) fn load_config_layers(
    global_path: Option<&Path>,
    local_path: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<ReadflowConfig> {
    if let Some(path) = explicit.filter(|path| !path.exists()) {
        return Err(ReadflowError::PathNotFound(path.display().to_string()));
    }

    let mut merged = Map::new();
    for path in [global_path, local_path, explicit].into_iter().flatten() {
        if let Some(layer) = read_layer(path)? {
            overlay_table(&mut merged, layer);
        }
    }

    let cfg: ReadflowConfig = Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| ReadflowError::ConfigParse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Parses one config file; `None` when it is absent.
fn read_layer(path: &Path) -> Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| ReadflowError::file(path, e))?;
    let table = content
        .parse::<toml::Table>()
        .map_err(|e| ReadflowError::ConfigParse(format!("{}: {}", path.display(), e)))?;
    Ok(Some(table))
}

/// Sections merge key by key; any other value in `layer` replaces the old one.
fn overlay_table(base: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(section)), Value::Table(overrides)) => {
                overlay_table(section, overrides);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
