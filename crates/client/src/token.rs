//! Bearer token storage.
//!
//! The token is kept in memory and, when a path is configured, mirrored to a
//! file so a restarted client stays logged in.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use crate::error::ClientError;

/// Holds the bearer token attached to every request.
#[derive(Debug, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
    token: RwLock<Option<String>>,
}

impl TokenStore {
    /// A store that forgets the token when dropped.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A store persisted at `path`, loading any token already saved there.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the file exists but cannot be read.
    pub fn open(path: PathBuf) -> Result<Self, ClientError> {
        let token = match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents.trim().to_owned()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            token: RwLock::new(token),
        })
    }

    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the token file cannot be written. The
    /// in-memory token is updated regardless.
    pub fn set(&self, token: &str) -> Result<(), ClientError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        if let Some(path) = &self.path {
            std::fs::write(path, token)?;
        }
        Ok(())
    }

    /// Forget the token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if the token file cannot be removed.
    pub fn clear(&self) -> Result<(), ClientError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let store = TokenStore::open(path.clone()).unwrap();
        assert_eq!(store.get(), None);
        store.set("abc.def.ghi").unwrap();

        let reopened = TokenStore::open(path.clone()).unwrap();
        assert_eq!(reopened.get().as_deref(), Some("abc.def.ghi"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(TokenStore::open(path).unwrap().get(), None);
    }

    #[test]
    fn test_in_memory_clear_is_idempotent() {
        let store = TokenStore::in_memory();
        store.clear().unwrap();
        store.set("t").unwrap();
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }
}
