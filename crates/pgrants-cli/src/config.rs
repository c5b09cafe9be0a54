//! Locating and reading `.config/pgrants.styx`.
//!
//! An explicit path must exist. Without one, the file is searched from the
//! working directory upwards, and inspection runs on defaults when none is
//! found.

use facet_styx::RenderError;
use pgrants::{Config, PrivilegeCatalog};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = ".config/pgrants.styx";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}:\n{report}", path.display())]
    Parse { path: PathBuf, report: String },
}

/// Load the configuration, returning the file it came from or `None` when
/// defaults apply.
pub fn load(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>), ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    load_from(explicit, &cwd)
}

fn load_from(
    explicit: Option<&Path>,
    start: &Path,
) -> Result<(Config, Option<PathBuf>), ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match start.ancestors().map(|dir| dir.join(CONFIG_FILE)).find(|p| p.exists()) {
            Some(path) => path,
            None => return Ok((Config::default(), None)),
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config: Config = facet_styx::from_str(&content).map_err(|e| ConfigError::Parse {
        report: e.render(&path.display().to_string(), &content).to_string(),
        path: path.clone(),
    })?;
    Ok((config, Some(path)))
}

/// Object types with managed privileges that `catalog` cannot inspect.
///
/// Such entries are silently never queried, so the CLI reports them.
pub fn uninspectable_objects<'a>(
    config: &'a Config,
    catalog: &PrivilegeCatalog,
) -> Vec<&'a str> {
    config
        .managed_privileges
        .keys()
        .filter(|object| catalog.get(object.as_str()).is_none())
        .map(String::as_str)
        .collect()
}
