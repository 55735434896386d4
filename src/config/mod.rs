//! Client configuration — council roster and UI timing.
//!
//! User-level config: `~/.council/config.yaml`
//! Project-level config: `.council/config.yaml` (keys present here win)
//!
//! Resolution: `--config` file alone, else user file overlaid by project
//! file, else built-in defaults. CLI flags are applied on top by `main`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Models that answer and rank in stages 1 and 2.
    pub council_models: Vec<String>,
    /// Model that writes the stage 3 synthesis.
    pub chairman_model: String,
    /// Delay between stage transitions in the offline council.
    pub stage_delay_ms: u64,
    /// Snapshot refresh interval.
    pub tick_ms: u64,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            council_models: vec![
                "openai/gpt-5.1".into(),
                "google/gemini-3-pro-preview".into(),
                "anthropic/claude-sonnet-4.5".into(),
                "x-ai/grok-4".into(),
            ],
            chairman_model: "google/gemini-3-pro-preview".into(),
            stage_delay_ms: 1200,
            tick_ms: 250,
        }
    }
}

/// A config file: every key optional so files can be layered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    council_models: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chairman_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stage_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tick_ms: Option<u64>,
}

impl ConfigFile {
    fn parse(path: &Path, content: &str) -> ConfigResult<Self> {
        // An empty YAML document parses as null; treat it as "no keys".
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn overlay(self, config: &mut CouncilConfig) {
        if let Some(models) = self.council_models {
            config.council_models = models;
        }
        if let Some(chairman) = self.chairman_model {
            config.chairman_model = chairman;
        }
        if let Some(delay) = self.stage_delay_ms {
            config.stage_delay_ms = delay;
        }
        if let Some(tick) = self.tick_ms {
            config.tick_ms = tick;
        }
    }
}

/// Path to `~/.council/`.
fn dirs_path() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|p| PathBuf::from(p).join(".council"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join(".council"))
    }
}

/// Path to the user-level config file.
pub fn user_config_path() -> Option<PathBuf> {
    dirs_path().map(|p| p.join("config.yaml"))
}

/// Path to the project-level config file.
pub fn project_config_path() -> PathBuf {
    PathBuf::from(".council").join("config.yaml")
}

impl CouncilConfig {
    /// Load user + project config. Missing files fall back to defaults;
    /// a malformed file is an error.
    pub fn load() -> ConfigResult<Self> {
        let mut paths = Vec::new();
        if let Some(user) = user_config_path() {
            paths.push(user);
        }
        paths.push(project_config_path());
        Self::load_layered(&paths)
    }

    /// Load a single explicit file, which must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::default();
        ConfigFile::parse(path, &content)?.overlay(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay each existing file in order onto the defaults.
    pub fn load_layered(paths: &[PathBuf]) -> ConfigResult<Self> {
        let mut config = Self::default();
        for path in paths {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(ConfigError::Read {
                        path: path.clone(),
                        source,
                    })
                }
            };
            tracing::debug!(path = %path.display(), "loading config");
            ConfigFile::parse(path, &content)?.overlay(&mut config);
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the offline council cannot run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.council_models.is_empty() {
            return Err(ConfigError::Invalid("council_models must not be empty".into()));
        }
        if self.council_models.len() > 26 {
            return Err(ConfigError::Invalid(
                "council_models supports at most 26 members (Response A..Z)".into(),
            ));
        }
        if self.chairman_model.trim().is_empty() {
            return Err(ConfigError::Invalid("chairman_model must not be empty".into()));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults_are_valid() {
        let config = CouncilConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.council_models.len(), 4);
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CouncilConfig::load_layered(&[dir.path().join("nope.yaml")]).unwrap();
        assert_eq!(config, CouncilConfig::default());
    }

    #[test]
    fn project_overrides_user() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.yaml",
            "council_models: [a/one, b/two]\nchairman_model: a/one\nstage_delay_ms: 50\n",
        );
        let project = write(&dir, "project.yaml", "chairman_model: b/two\n");

        let config = CouncilConfig::load_layered(&[user, project]).unwrap();
        assert_eq!(config.council_models, vec!["a/one", "b/two"]);
        assert_eq!(config.chairman_model, "b/two");
        assert_eq!(config.stage_delay_ms, 50);
        assert_eq!(config.tick_ms, 250);
    }

    #[test]
    fn empty_file_is_no_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.yaml", "");
        assert_eq!(CouncilConfig::load_from(&path).unwrap(), CouncilConfig::default());
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.yaml", "council_models: {not: [a list\n");
        let err = CouncilConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = CouncilConfig::load_from(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn empty_council_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "c.yaml", "council_models: []\n");
        let err = CouncilConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("council_models"));
    }
}
