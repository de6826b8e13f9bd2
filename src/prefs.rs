use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::PathBuf};

pub const PREF_DATA_FILES: &str = "data_files";
pub const PREF_ENCODING: &str = "encoding";
pub const PREF_UI_SCALING: &str = "ui_scaling";
pub const PREF_CAPSULE_SHAPE: &str = "allow_capsule_shape";
pub const PREF_PRELOAD: &str = "preload";
pub const PREF_CUSTOM_RESOLUTION: &str = "custom_resolution";

/// User preferences, persisted as JSON in the app data dir. The launch
/// orchestration reads these and never writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(skip)]
    path: PathBuf,
}

impl Preferences {
    pub fn load_or_create(data_dir: &PathBuf) -> Result<Self> {
        fs::create_dir_all(data_dir).context("create app data dir")?;
        let path = data_dir.join("prefs.json");
        if path.exists() {
            let raw = fs::read_to_string(&path).context("read preferences")?;
            let mut prefs: Preferences = serde_json::from_str(&raw).context("parse preferences")?;
            prefs.path = path;
            return Ok(prefs);
        }

        let prefs = Preferences {
            values: BTreeMap::new(),
            path,
        };
        prefs.save()?;
        Ok(prefs)
    }

    pub fn save(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("serialize preferences")?;
        fs::write(&self.path, raw).context("write preferences")?;
        Ok(())
    }

    /// Stored value, or the documented per-key default when unset.
    pub fn get(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(value) => value.clone(),
            None => default_for(key).to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    #[cfg(test)]
    pub fn from_entries(entries: &[(&str, &str)]) -> Self {
        let values = entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Preferences {
            values,
            path: PathBuf::new(),
        }
    }
}

fn default_for(key: &str) -> &'static str {
    match key {
        PREF_ENCODING => "win1252",
        PREF_UI_SCALING => "1.0",
        PREF_CAPSULE_SHAPE => "true",
        PREF_PRELOAD => "false",
        // data_files and custom_resolution default to empty on purpose:
        // absence is a meaningful state for both.
        _ => "",
    }
}
