//! Normalizer configuration, loadable from `relq.yml`

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default nesting limit for a single normalization run.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration for a normalization pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizeConfig {
    /// Maximum nested dispatch depth before the run fails with a
    /// resource-exhaustion error instead of overflowing the stack
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Which rewrite passes are registered in the composition
    #[serde(default)]
    pub passes: PassToggles,
}

/// Per-pass enable switches.
///
/// The structural fallback module is always registered and has no switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassToggles {
    /// Fold side-effect-free subtrees into constants
    #[serde(default = "default_true")]
    pub partial_evaluation: bool,

    /// Inline or materialize constants wrapping deferred query sources
    #[serde(default = "default_true")]
    pub constant_resolution: bool,

    /// Reduce calls in the deferred operator family
    #[serde(default = "default_true")]
    pub queryable_reduction: bool,

    /// Reduce calls in the immediate operator family
    #[serde(default = "default_true")]
    pub enumerable_reduction: bool,

    /// Replace member reads on captured values with the value itself
    #[serde(default = "default_true")]
    pub closure_expansion: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for PassToggles {
    fn default() -> Self {
        Self {
            partial_evaluation: true,
            constant_resolution: true,
            queryable_reduction: true,
            enumerable_reduction: true,
            closure_expansion: true,
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            passes: PassToggles::default(),
        }
    }
}

impl NormalizeConfig {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a directory containing relq.yml or relq.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("relq.yml");
        let yaml_path = dir.join("relq.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        let config: NormalizeConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        log::debug!(
            "Loaded normalize config (max_depth = {}, passes = {:?})",
            config.max_depth,
            config.passes
        );
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_depth == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "max_depth must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
