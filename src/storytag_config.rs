//! The `storytag.toml` configuration file.
//!
//! # Configuration File Format
//!
//! ```toml
//! [tracker]
//! project_id = "1234567"
//! api_url = "https://www.pivotaltracker.com/services/v5"
//! page_size = 500
//! max_pages = 2
//! timeout_secs = 30
//!
//! [tagging]
//! prefix = "PROJ"
//!
//! # or, for one sequence per category:
//! # [[tagging.categories]]
//! # code = "API"
//! # label = "api"
//! ```
//!
//! The API token is never read from or written to this file; it comes from
//! `PIVOTAL_TRACKER_API_TOKEN` (or a `.env` file).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::tagging::CategoryDef;

pub const CONFIG_FILE_NAME: &str = "storytag.toml";

/// `[tracker]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Stories requested per page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Upper bound on pages fetched per pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// `[tagging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggingSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryDef>,
}

/// The complete storytag.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorytagToml {
    #[serde(default)]
    pub tracker: TrackerSection,
    #[serde(default)]
    pub tagging: TaggingSection,
}

impl StorytagToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;
        let content = toml::to_string_pretty(self).context("Failed to serialize storytag.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// A starter file for `storytag config init`.
    pub fn template() -> Self {
        Self {
            tracker: TrackerSection {
                project_id: Some("0000000".to_string()),
                ..Default::default()
            },
            tagging: TaggingSection {
                prefix: Some("PROJ".to_string()),
                categories: Vec::new(),
            },
        }
    }

    /// Non-fatal problems worth telling the user about.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(prefix) = &self.tagging.prefix
            && prefix.trim().is_empty()
        {
            warnings.push("tagging.prefix is empty and will be ignored".to_string());
        }

        let mut labels: Vec<&str> = Vec::new();
        for def in &self.tagging.categories {
            if labels.contains(&def.label.as_str()) {
                warnings.push(format!(
                    "Label '{}' maps to more than one category; the first one wins",
                    def.label
                ));
            }
            labels.push(&def.label);
        }

        if self.tracker.page_size.is_some_and(|n| n > 500) {
            warnings.push("tracker.page_size above 500 is capped by Pivotal Tracker".to_string());
        }

        warnings
    }
}

/// Locate the config file: explicit path, then `./storytag.toml`, then the
/// user config directory (`<config_dir>/storytag/storytag.toml`).
///
/// An explicit path is returned even if missing so loading reports the error.
pub fn find_config_file(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("storytag").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}
