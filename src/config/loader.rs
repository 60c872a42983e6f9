use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::core::CallTypesConfig;
use crate::errors::{CallTypesError, Result};

/// Name of the configuration file searched for in the working directory and its ancestors
pub const CONFIG_FILE_NAME: &str = ".calltypes.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
fn read_config_file(path: &Path) -> anyhow::Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents)
}

/// Pure function to parse config from a TOML string
pub fn parse_config(contents: &str) -> Result<CallTypesConfig> {
    let config = toml::from_str::<CallTypesConfig>(contents)
        .map_err(|e| CallTypesError::config(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e)))?;

    if config.comments.continuation_marker.trim().is_empty() {
        return Err(CallTypesError::config(
            "comments.continuation_marker must not be empty",
        ));
    }

    Ok(config)
}

/// Try loading config from a specific path
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<CallTypesConfig> {
    if !config_path.is_file() {
        return None;
    }

    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("{:#}. Using defaults.", e);
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Load configuration starting from `start`, falling back to defaults
pub(crate) fn load_config_from(start: PathBuf) -> CallTypesConfig {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No {} found after checking {} directories. Using default config.",
                CONFIG_FILE_NAME,
                MAX_TRAVERSAL_DEPTH
            );
            CallTypesConfig::default()
        })
}

pub fn load_config() -> CallTypesConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            CallTypesConfig::default()
        }
    }
}
