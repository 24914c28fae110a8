use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

const SESSION_PATH: &str = "~/.config/shopfront/session.json";

/// Signed in admin. Holding one is what lets `add` and `delete` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub access_token: String,
}

pub fn default_path() -> Result<PathBuf> {
    let path = shellexpand::full(SESSION_PATH)
        .with_context(|| format!("Session file path {} is invalid", SESSION_PATH))?;
    Ok(Path::new(path.as_ref()).to_owned())
}

pub fn read(path: &Path) -> Result<Option<Session>> {
    match std::fs::read_to_string(path) {
        Ok(c) => serde_json::from_str(&c)
            .map(Some)
            .with_context(|| "Error de-serialising session file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Admin gate, fails unless someone has signed in.
pub fn require(path: &Path) -> Result<Session> {
    read(path)?.ok_or_else(|| Error::msg("Not signed in as admin, run `shopfront login --email <email>` first"))
}

pub fn write(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error ensuring path {:?} exists", parent))?;
    }
    let session = serde_json::to_string(session)?;
    std::fs::write(path, session).with_context(|| "Error writing session file")
}

pub fn clear(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No session to clear at {:?}", path);
            Ok(())
        }
        Err(e) => Err(e).with_context(|| "Error removing session file"),
    }
}
