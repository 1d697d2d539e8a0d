use crate::error::AppError;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

const STORE_DIR_ENV_VAR: &str = "REALIZE_STORE_DIR";

/// String-keyed persistence for whole encoded values.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

pub type SharedStore = Arc<dyn BlobStore>;

pub fn store_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("realize"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("realize"))
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(AppError::invalid_input(format!("invalid store key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::io(format!("{}: {}", path.display(), err))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|err| AppError::io(err.to_string()))?;
        std::fs::write(&path, value)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::io(format!("{}: {}", path.display(), err))),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_blobs<R>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> R) -> R {
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut blobs)
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.with_blobs(|blobs| blobs.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.with_blobs(|blobs| blobs.insert(key.to_string(), value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.with_blobs(|blobs| blobs.remove(key));
        Ok(())
    }
}
