//! Triage configuration.
//!
//! Config file: ~/.config/triage/config.toml or /etc/triage/config.toml
//!
//! ```toml
//! [artifacts]
//! model_path = "/home/me/.local/share/triage/ticket_classifier.json"
//! vocab_path = "/home/me/.local/share/triage/vectorizer.json"
//!
//! [training]
//! samples = 2000
//! tree_count = 100
//! seed = 42
//! max_features = 1000
//! train_fraction = 0.8
//! ```

use crate::artifact::{MODEL_FILE, VOCAB_FILE};
use crate::error::{Result, TriageError};
use crate::evaluation::DEFAULT_TRAIN_FRACTION;
use crate::forest::{ForestParams, DEFAULT_SEED, DEFAULT_TREE_COUNT};
use crate::vectorizer::DEFAULT_MAX_FEATURES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform config/data dirs
const APP_DIR: &str = "triage";
const CONFIG_FILE: &str = "config.toml";

/// System config path
pub const SYSTEM_CONFIG_PATH: &str = "/etc/triage/config.toml";

/// Default corpus size for training runs
pub const DEFAULT_SAMPLES: usize = 2000;

/// Where trained artifacts live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSettings {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default = "default_vocab_path")]
    pub vocab_path: PathBuf,
}

/// Platform data dir, falling back to the working directory
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}

fn default_model_path() -> PathBuf {
    data_dir().join(MODEL_FILE)
}

fn default_vocab_path() -> PathBuf {
    data_dir().join(VOCAB_FILE)
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            vocab_path: default_vocab_path(),
        }
    }
}

impl ArtifactSettings {
    /// Both artifacts inside one directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model_path: dir.join(MODEL_FILE),
            vocab_path: dir.join(VOCAB_FILE),
        }
    }
}

/// Training-run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// Synthetic examples per run
    #[serde(default = "default_samples")]
    pub samples: usize,

    #[serde(default = "default_tree_count")]
    pub tree_count: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Vocabulary cap (valid: 1-100000)
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Share of each tier used for training (valid: 0.05-0.95)
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,

    /// Unset grows trees until pure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
}

fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

fn default_tree_count() -> usize {
    DEFAULT_TREE_COUNT
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_max_features() -> usize {
    DEFAULT_MAX_FEATURES
}

fn default_train_fraction() -> f64 {
    DEFAULT_TRAIN_FRACTION
}

fn default_min_samples_split() -> usize {
    2
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            tree_count: default_tree_count(),
            seed: default_seed(),
            max_features: default_max_features(),
            train_fraction: default_train_fraction(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
        }
    }
}

impl TrainingSettings {
    pub fn effective_tree_count(&self) -> usize {
        self.tree_count.max(1)
    }

    pub fn effective_max_features(&self) -> usize {
        self.max_features.clamp(1, 100_000)
    }

    pub fn effective_train_fraction(&self) -> f64 {
        if self.train_fraction.is_nan() {
            return default_train_fraction();
        }
        self.train_fraction.clamp(0.05, 0.95)
    }

    pub fn train_fraction_was_clamped(&self) -> bool {
        self.train_fraction != self.effective_train_fraction()
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            tree_count: self.effective_tree_count(),
            seed: self.seed,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split.max(2),
            max_features_per_split: None,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub artifacts: ArtifactSettings,

    #[serde(default)]
    pub training: TrainingSettings,
}

impl TriageConfig {
    /// ~/.config/triage/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn system_config_path() -> PathBuf {
        PathBuf::from(SYSTEM_CONFIG_PATH)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| TriageError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config (~/.config/triage/config.toml)
    /// 3. System config (/etc/triage/config.toml)
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        Ok(Self::default())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| TriageError::Config(format!("Failed to serialize configuration: {}", e)))?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Save to the user config file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::user_config_path()
            .ok_or_else(|| TriageError::Config("Cannot determine config directory".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Set one value by dotted key, e.g. `training.seed`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| TriageError::Config(format!("Invalid value for {}: '{}'", key, value)))
        }

        match key {
            "artifacts.model_path" => self.artifacts.model_path = PathBuf::from(value),
            "artifacts.vocab_path" => self.artifacts.vocab_path = PathBuf::from(value),
            "training.samples" => self.training.samples = parse(key, value)?,
            "training.tree_count" => self.training.tree_count = parse(key, value)?,
            "training.seed" => self.training.seed = parse(key, value)?,
            "training.max_features" => self.training.max_features = parse(key, value)?,
            "training.train_fraction" => self.training.train_fraction = parse(key, value)?,
            "training.min_samples_split" => self.training.min_samples_split = parse(key, value)?,
            "training.max_depth" => {
                self.training.max_depth = match value.trim() {
                    "" | "none" | "unset" => None,
                    v => Some(parse(key, v)?),
                }
            }
            _ => return Err(TriageError::Config(format!("Unknown config key: '{}'", key))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TriageConfig::default();
        assert_eq!(config.training.samples, 2000);
        assert_eq!(config.training.tree_count, 100);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.max_features, 1000);
        assert!(config.artifacts.model_path.ends_with(MODEL_FILE));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TriageConfig = toml::from_str("[training]\nseed = 7\n").unwrap();
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.tree_count, 100);
        assert_eq!(config.artifacts, ArtifactSettings::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut original = TriageConfig::default();
        original.artifacts = ArtifactSettings::in_dir(dir.path());
        original.training.max_depth = Some(12);
        original.save_to(&path).unwrap();

        let parsed = TriageConfig::load(Some(&path)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        let err = TriageConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, TriageError::Config(_)));
    }

    #[test]
    fn test_clamping() {
        let mut settings = TrainingSettings::default();
        settings.train_fraction = 1.5;
        settings.tree_count = 0;
        assert_eq!(settings.effective_train_fraction(), 0.95);
        assert!(settings.train_fraction_was_clamped());
        assert_eq!(settings.effective_tree_count(), 1);
        assert_eq!(settings.forest_params().tree_count, 1);
    }

    #[test]
    fn test_set_values() {
        let mut config = TriageConfig::default();
        config.set("training.seed", "99").unwrap();
        config.set("training.max_depth", "8").unwrap();
        config.set("artifacts.model_path", "/tmp/m.json").unwrap();
        assert_eq!(config.training.seed, 99);
        assert_eq!(config.training.max_depth, Some(8));
        assert_eq!(config.artifacts.model_path, PathBuf::from("/tmp/m.json"));

        config.set("training.max_depth", "none").unwrap();
        assert_eq!(config.training.max_depth, None);

        assert!(config.set("training.seed", "abc").is_err());
        assert!(config.set("output.color", "none").is_err());
    }
}
