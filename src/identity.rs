use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

const USER_ID_FILE: &str = "user_id";

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Failed to read or write user id at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory holding the anonymous user id
pub fn default_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("litfinder")
}

/// Return the anonymous user id stored in `dir`, creating one on first use
pub fn load_or_create_user_id(dir: &Path) -> Result<String, IdentityError> {
    let path = dir.join(USER_ID_FILE);
    let io_err = |source| IdentityError::Io {
        path: path.clone(),
        source,
    };

    if path.exists() {
        let existing = fs::read_to_string(&path).map_err(io_err)?;
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    let id = Uuid::new_v4().to_string();
    fs::create_dir_all(dir).map_err(io_err)?;
    fs::write(&path, &id).map_err(io_err)?;
    info!(user_id = %id, "Created anonymous user id");
    Ok(id)
}
