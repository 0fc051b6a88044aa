//! services/app/src/state/settings.rs
//!
//! The local settings draft. Saved to the profile store under
//! `userSettings`; never round-tripped to the server.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use doclens_core::ports::{PortResult, ProfileStorage, SETTINGS_KEY};

use super::lock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    #[default]
    Dark,
}

impl ThemePreference {
    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default)]
    pub email_notifications: bool,
    #[serde(default)]
    pub theme: ThemePreference,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SettingsDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            language: default_language(),
            notifications: true,
            email_notifications: false,
            theme: ThemePreference::default(),
        }
    }
}

pub struct SettingsStore {
    storage: Arc<dyn ProfileStorage>,
    draft: Mutex<SettingsDraft>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn ProfileStorage>) -> Self {
        let draft = storage
            .get(SETTINGS_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(draft) => Some(draft),
                Err(error) => {
                    warn!("persisted settings are corrupt, using defaults: {error}");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            storage,
            draft: Mutex::new(draft),
        }
    }

    pub fn draft(&self) -> SettingsDraft {
        lock(&self.draft).clone()
    }

    pub fn theme(&self) -> ThemePreference {
        lock(&self.draft).theme
    }

    /// Replaces and persists the draft.
    pub fn save(&self, draft: SettingsDraft) -> PortResult<()> {
        let encoded = serde_json::to_string(&draft).map_err(|e| {
            doclens_core::ports::PortError::Unexpected(format!("cannot encode settings: {e}"))
        })?;
        *lock(&self.draft) = draft;
        self.storage.set(SETTINGS_KEY, &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::MemoryStorage;

    #[test]
    fn saved_draft_survives_reload() {
        let storage = Arc::new(MemoryStorage::default());
        {
            let settings = SettingsStore::new(storage.clone());
            let mut draft = settings.draft();
            draft.name = "Ada".to_string();
            draft.theme = ThemePreference::Light;
            settings.save(draft).unwrap();
        }

        let reloaded = SettingsStore::new(storage);
        assert_eq!(reloaded.draft().name, "Ada");
        assert_eq!(reloaded.theme(), ThemePreference::Light);
    }

    #[test]
    fn corrupt_draft_falls_back_to_defaults() {
        let storage = Arc::new(MemoryStorage::default());
        storage.set(SETTINGS_KEY, "{{{").unwrap();
        let settings = SettingsStore::new(storage);
        assert_eq!(settings.draft(), SettingsDraft::default());
    }

    #[test]
    fn theme_toggle_round_trips() {
        assert_eq!(
            ThemePreference::Dark.toggled().toggled(),
            ThemePreference::Dark
        );
    }
}
