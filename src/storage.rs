use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A table of records keyed by id, persisted as a single JSON document.
pub type DB<T> = HashMap<String, T>;

#[derive(Debug, Error)]
pub enum DBError {
    #[error("database io error: {0}")]
    Io(#[from] io::Error),
    #[error("database encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Loads a table from `path`. A missing file is an empty table.
pub fn load_db<T: DeserializeOwned>(path: &Path) -> Result<DB<T>, DBError> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(err) => Err(err.into()),
    }
}

/// Writes the table next to `path` and renames it into place, so a crash
/// mid-write never leaves a truncated table behind.
pub fn save_db<T: Serialize>(path: &Path, db: &DB<T>) -> Result<(), DBError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(db)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
