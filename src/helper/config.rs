//! Resolver configuration file parsing.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::ds::error::{HelperError, HelperResult};

/// What a same-scope redeclaration does to the aliases of the declaration it
/// overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedeclarationPolicy {
    /// The later declaration fully replaces the earlier one, names included.
    #[default]
    Replace,
    /// Only the slots the later declaration occupies are overwritten. Other
    /// names keep pointing at the earlier declaration.
    KeepAliases,
}

/// Which declaration an eager (`subject!` / `let!`) action forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EagerTarget {
    /// Exactly the declaration marked eager, even if an inner group shadows it.
    #[default]
    Declared,
    /// Whatever the eager declaration's identifier resolves to for the
    /// running example.
    Resolved,
}

/// Complete resolver configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub redeclaration: RedeclarationPolicy,
    pub eager_target: EagerTarget,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_redeclaration(mut self, policy: RedeclarationPolicy) -> Self {
        self.redeclaration = policy;
        self
    }

    pub fn with_eager_target(mut self, target: EagerTarget) -> Self {
        self.eager_target = target;
        self
    }

    /// Load configuration from a TOML file.
    ///
    /// Expected format:
    /// ```toml
    /// redeclaration = "keep-aliases"   # or "replace"
    /// eager_target = "resolved"        # or "declared"
    /// ```
    pub fn load(path: &Path) -> HelperResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HelperError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys take their defaults.
    pub fn parse(content: &str) -> HelperResult<Self> {
        toml::from_str(content)
            .map_err(|e| HelperError::Config(format!("Failed to parse config: {}", e)))
    }
}
