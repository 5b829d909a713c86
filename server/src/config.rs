//! Fake rank settings file
//!
//! Lives at `<root>/configs/plugins/LevelsRanks/settings_fakerank.json`. The
//! file is written with defaults on first start and left alone afterwards,
//! so operators can edit it by hand.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const SETTINGS_DIR: &str = "configs/plugins/LevelsRanks";
const SETTINGS_FILE: &str = "settings_fakerank.json";
const RANK_LEVELS: u32 = 18;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Poll interval must be greater than zero, got {0:?}")]
    InvalidPollInterval(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeRankSection {
    #[serde(rename = "Type")]
    pub kind: String,
    /// Level to displayed rank lookup, kept for manual tuning
    #[serde(rename = "FakeRank")]
    pub fake_rank: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeRankSettings {
    #[serde(rename = "LR_FakeRank")]
    pub fake_rank: FakeRankSection,
}

impl Default for FakeRankSettings {
    fn default() -> Self {
        let fake_rank = (1..=RANK_LEVELS)
            .map(|level| (level.to_string(), level.to_string()))
            .collect();

        Self {
            fake_rank: FakeRankSection {
                kind: "1".to_string(),
                fake_rank,
            },
        }
    }
}

impl FakeRankSettings {
    pub fn path(root: &Path) -> PathBuf {
        root.join(SETTINGS_DIR).join(SETTINGS_FILE)
    }

    /// Reads the settings file, writing the defaults first if it is missing
    ///
    /// Only a failure to create the file is an error. An existing file that
    /// cannot be read or has a different shape is left untouched and the
    /// defaults are used instead.
    pub fn load_or_create(root: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(root);

        if !path.exists() {
            let defaults = Self::default();
            defaults.write_new(&path)?;
            info!("Created default fake rank settings at {}", path.display());
            return Ok(defaults);
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path.display(), e);
                return Ok(Self::default());
            }
        };

        match serde_json::from_str::<Self>(&contents) {
            Ok(settings) => {
                info!("Loaded fake rank settings from {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                warn!("Unexpected settings in {}: {}, using defaults", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    fn write_new(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
