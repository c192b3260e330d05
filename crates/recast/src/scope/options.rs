// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scope policy flags.
//!
//! # Example YAML
//!
//! ```yaml
//! # recast.yaml
//! deep_copy: false
//! disable_zero_copy: true
//! allow_private_fields: false
//! strict_nil_check: true
//! ```

#[cfg(feature = "config-loaders")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "config-loaders")]
use std::path::Path;

/// Policy flags of a [`Scope`](super::Scope). Frozen once the scope is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct ScopeOptions {
    /// Never alias: every pair, including `T -> T`, goes through the composite path.
    pub deep_copy: bool,
    /// Alias only identical types, never merely layout-compatible ones.
    pub disable_zero_copy: bool,
    /// Let private record fields take part in matching and layout checks.
    pub allow_private_fields: bool,
    /// Fail with `NilIndirection` when a nil source pointer meets a destination that cannot be nil.
    pub strict_nil_check: bool,
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        other => {
            log::warn!("[ScopeOptions] ignoring {}={:?}", name, other);
            None
        }
    }
}

impl ScopeOptions {
    /// Defaults overridden by `RECAST_*` environment variables.
    ///
    /// Recognized: `RECAST_DEEP_COPY`, `RECAST_DISABLE_ZERO_COPY`,
    /// `RECAST_ALLOW_PRIVATE_FIELDS`, `RECAST_STRICT_NIL_CHECK`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `RECAST_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_flag("RECAST_DEEP_COPY") {
            self.deep_copy = v;
        }
        if let Some(v) = env_flag("RECAST_DISABLE_ZERO_COPY") {
            self.disable_zero_copy = v;
        }
        if let Some(v) = env_flag("RECAST_ALLOW_PRIVATE_FIELDS") {
            self.allow_private_fields = v;
        }
        if let Some(v) = env_flag("RECAST_STRICT_NIL_CHECK") {
            self.strict_nil_check = v;
        }
        self
    }

    /// Parse YAML content.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| format!("Failed to parse YAML: {}", e))
    }

    /// Parse JSON content.
    #[cfg(feature = "config-loaders")]
    pub fn from_json_str(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("Failed to parse JSON: {}", e))
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    #[cfg(feature = "config-loaders")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(format!("Unsupported config extension: {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_all_off() {
        let opts = ScopeOptions::default();
        assert!(!opts.deep_copy);
        assert!(!opts.disable_zero_copy);
        assert!(!opts.allow_private_fields);
        assert!(!opts.strict_nil_check);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("RECAST_STRICT_NIL_CHECK", "yes");
        std::env::set_var("RECAST_DISABLE_ZERO_COPY", "bogus");
        let opts = ScopeOptions::default().with_env_overrides();
        std::env::remove_var("RECAST_STRICT_NIL_CHECK");
        std::env::remove_var("RECAST_DISABLE_ZERO_COPY");
        assert!(opts.strict_nil_check);
        assert!(!opts.disable_zero_copy);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_partial() {
        let opts = ScopeOptions::from_yaml_str("deep_copy: true\n").unwrap();
        assert!(opts.deep_copy);
        assert!(!opts.strict_nil_check);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_from_file() {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{\"allow_private_fields\": true}}").unwrap();
        let opts = ScopeOptions::from_file(file.path()).unwrap();
        assert!(opts.allow_private_fields);

        let bad = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(ScopeOptions::from_file(bad.path()).is_err());
    }
}
