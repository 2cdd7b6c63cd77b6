//! Configuration loading and parsing for `rocket-releaser.toml` files.
//!
//! Every field is optional. A missing file means defaults.
use log::*;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::{
    Result,
    changelog::ChangelogStyle,
    error::ReleaserError,
    notes::{DEFAULT_CATEGORY_PREFIX, QA_HEADER, RELEASE_HEADER},
    tracker::config::{
        DEFAULT_CODE_REVIEW_TRANSITION, DEFAULT_READY_TO_TEST_TRANSITION,
    },
};

/// Default configuration filename, looked up in the repository directory.
pub const DEFAULT_CONFIG_FILE: &str = "rocket-releaser.toml";

/// Changelog rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)] // Use default for missing fields
pub struct ChangelogConfig {
    /// Which of the two changelog layouts to render.
    pub style: ChangelogStyle,
    /// Label prefix marking a category, e.g. `feat-` in `feat-Billing`.
    pub category_prefix: String,
    /// Header word that opens the release notes block.
    pub release_header: String,
    /// Header word that opens the notes-for-QA block.
    pub qa_header: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            style: ChangelogStyle::default(),
            category_prefix: DEFAULT_CATEGORY_PREFIX.into(),
            release_header: RELEASE_HEADER.into(),
            qa_header: QA_HEADER.into(),
        }
    }
}

/// Names of the environments that drive ticket transitions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvironmentNames {
    pub preview: String,
    pub staging: String,
    pub production: String,
}

impl Default for EnvironmentNames {
    fn default() -> Self {
        Self {
            preview: "preview".into(),
            staging: "staging".into(),
            production: "production".into(),
        }
    }
}

impl EnvironmentNames {
    /// Preview and staging deploys are where QA happens.
    pub fn is_pre_production(&self, env_name: &str) -> bool {
        env_name.eq_ignore_ascii_case(&self.preview)
            || env_name.eq_ignore_ascii_case(&self.staging)
    }
}

/// Jira workflow transition ids. These differ per Jira workflow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransitionIds {
    pub code_review: String,
    pub ready_to_test: String,
}

impl Default for TransitionIds {
    fn default() -> Self {
        Self {
            code_review: DEFAULT_CODE_REVIEW_TRANSITION.into(),
            ready_to_test: DEFAULT_READY_TO_TEST_TRANSITION.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub transitions: TransitionIds,
}

/// Root configuration structure for `rocket-releaser.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Changelog generation settings.
    pub changelog: ChangelogConfig,
    /// Environment names used for transition policy.
    pub environments: EnvironmentNames,
    /// Jira workflow settings.
    pub jira: JiraConfig,
}

impl Config {
    /// Load `explicit` if given, else `rocket-releaser.toml` in `repo_dir`
    /// when present, else defaults. An explicit path that does not exist is
    /// an error.
    pub fn load(explicit: Option<&Path>, repo_dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ReleaserError::invalid_config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let path = repo_dir.join(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    info!("repository configuration not found: using default");
                    return Ok(Self::default());
                }
                path
            }
        };

        debug!("loading configuration from {}", path.display());
        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }
}
