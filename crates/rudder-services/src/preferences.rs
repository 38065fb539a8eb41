//! Persisted per-user preferences, one JSON file per user.

use std::fs;
use std::path::{Path, PathBuf};

use rudder_events::UserId;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Preferences remembered across sessions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserPreferences {
    /// Whether newly added torrents start immediately. Updated each time the
    /// user adds torrents, so the last choice becomes the default.
    pub start_torrents_on_load: bool,
}

/// JSON-file preference store rooted at one directory.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    dir: PathBuf,
}

impl PreferenceStore {
    /// Store preferences under `dir`, one `<user>.json` per user.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user: &UserId) -> PathBuf {
        self.dir.join(format!("{}.json", user.as_str()))
    }

    /// Load `user`'s preferences; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or decoded.
    pub fn load(&self, user: &UserId) -> ServiceResult<UserPreferences> {
        let path = self.path_for(user);
        if !path.exists() {
            return Ok(UserPreferences::default());
        }
        let raw = fs::read_to_string(&path).map_err(|source| ServiceError::PreferenceIo {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ServiceError::PreferenceDecode { path, source })
    }

    /// Persist `user`'s preferences, creating the store directory on demand.
    ///
    /// # Errors
    ///
    /// Fails when the directory or file cannot be written.
    pub fn save(&self, user: &UserId, preferences: &UserPreferences) -> ServiceResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| ServiceError::PreferenceIo {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(user);
        let serialised = serde_json::to_string_pretty(preferences).map_err(|source| {
            ServiceError::PreferenceDecode {
                path: path.clone(),
                source,
            }
        })?;
        write_atomic(&path, serialised.as_bytes())
    }

    /// Remove `user`'s preference file. Missing files are a no-op.
    ///
    /// # Errors
    ///
    /// Fails when an existing file cannot be removed.
    pub fn remove(&self, user: &UserId) -> ServiceResult<()> {
        let path = self.path_for(user);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ServiceError::PreferenceIo { path, source }),
        }
    }
}

/// Write through a sibling temp file so readers never observe a torn file.
fn write_atomic(path: &Path, bytes: &[u8]) -> ServiceResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|source| ServiceError::PreferenceIo {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| ServiceError::PreferenceIo {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = PreferenceStore::new(dir.path());
        let preferences = store.load(&UserId::new("alice"))?;
        assert!(!preferences.start_torrents_on_load);
        Ok(())
    }

    #[test]
    fn save_then_load_round_trips() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = PreferenceStore::new(dir.path().join("prefs"));
        let user = UserId::new("alice");

        store.save(
            &user,
            &UserPreferences {
                start_torrents_on_load: true,
            },
        )?;
        assert!(store.load(&user)?.start_torrents_on_load);

        store.save(
            &user,
            &UserPreferences {
                start_torrents_on_load: false,
            },
        )?;
        assert!(!store.load(&user)?.start_torrents_on_load);
        Ok(())
    }

    #[test]
    fn users_do_not_share_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = PreferenceStore::new(dir.path());
        store.save(
            &UserId::new("alice"),
            &UserPreferences {
                start_torrents_on_load: true,
            },
        )?;
        assert!(!store.load(&UserId::new("bob"))?.start_torrents_on_load);
        Ok(())
    }

    #[test]
    fn remove_is_noop_for_missing_users() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = PreferenceStore::new(dir.path());
        store.remove(&UserId::new("ghost"))?;

        let user = UserId::new("alice");
        store.save(&user, &UserPreferences::default())?;
        store.remove(&user)?;
        assert!(!store.load(&user)?.start_torrents_on_load);
        Ok(())
    }
}
