//! Locations of local files.
//!
//! One override directory (the CLI's `--dir`) holds every local file in
//! a single place. With no override the config file and the database
//! split into the usual per-user locations under `$HOME`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory name under the per-user base directories.
const APP_DIR: &str = "cinedex";

/// Returns the config file path: `{override}/config.toml` or
/// `~/.config/cinedex/config.toml`.
///
/// # Errors
///
/// Returns an error if `HOME` is unset and no override is given.
pub fn config_file(override_dir: Option<&Path>) -> Result<PathBuf> {
    Ok(base_dir(override_dir, &[".config"])?.join("config.toml"))
}

/// Returns the database file path: `{override}/cinedex.db` or
/// `~/.local/share/cinedex/cinedex.db`.
///
/// # Errors
///
/// Returns an error if `HOME` is unset and no override is given.
pub fn database_file(override_dir: Option<&Path>) -> Result<PathBuf> {
    Ok(base_dir(override_dir, &[".local", "share"])?.join("cinedex.db"))
}

/// The directory a local file lives in: the override verbatim, or
/// `$HOME/{segments...}/cinedex`.
fn base_dir(override_dir: Option<&Path>, home_segments: &[&str]) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    let mut dir = PathBuf::from(home);
    for segment in home_segments {
        dir.push(segment);
    }
    dir.push(APP_DIR);
    Ok(dir)
}
