// src/settings.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;

/// Everything the client keeps on the device between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user_id: Option<String>,
    pub auth_token: Option<String>,
    /// Transfer letter picked but not yet uploaded with a booking.
    pub pending_transfer_letter: Option<PathBuf>,
    pub location_setup_complete: bool,
    pub last_known_location: Option<(f64, f64)>,
}

impl Settings {
    pub fn has_completed_location_setup(&self) -> bool {
        self.location_setup_complete
    }

    /// Zero coordinates mean "never recorded".
    pub fn last_known_location(&self) -> Option<(f64, f64)> {
        self.last_known_location
            .filter(|(lat, lng)| *lat != 0.0 || *lng != 0.0)
    }
}

/// Shared handle to the settings document. `None` path keeps it in memory.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    current: Arc<Mutex<Settings>>,
    // one read-modify-persist at a time
    writer: Arc<tokio::sync::Mutex<()>>,
}

impl SettingsStore {
    /// Load from `path`; a missing file starts from defaults.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref().to_path_buf();
        let settings = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ApiError::Storage(format!("{} is not valid settings JSON: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        debug!(path = %path.display(), "settings loaded");

        Ok(Self {
            path: Some(path),
            current: Arc::new(Mutex::new(settings)),
            writer: Arc::default(),
        })
    }

    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            current: Arc::new(Mutex::new(settings)),
            writer: Arc::default(),
        }
    }

    pub fn get(&self) -> Settings {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.get().user_id.filter(|id| !id.trim().is_empty())
    }

    /// Apply `change` and persist the result. Readers only see the new
    /// settings once they are on disk; a failed write leaves them untouched.
    pub async fn update<F>(&self, change: F) -> Result<Settings, ApiError>
    where
        F: FnOnce(&mut Settings),
    {
        let _writer = self.writer.lock().await;

        let mut next = self.get();
        change(&mut next);
        self.persist(&next).await?;

        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = next.clone();
        Ok(next)
    }

    async fn persist(&self, settings: &Settings) -> Result<(), ApiError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(settings)
            .map_err(|e| ApiError::Storage(format!("cannot encode settings: {e}")))?;

        // replaced atomically: write a sibling, then rename over
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| ApiError::Storage(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| ApiError::Storage(format!("cannot replace {}: {e}", path.display())))?;
        Ok(())
    }
}
