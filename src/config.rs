use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::convenience::DecodeMode;
use crate::errors::ConfigError;
use crate::simd::{self, Capabilities, Tier};

/// Which tiers the dispatcher may use.
///
/// The scalar tier can never be disabled.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Fastest tier allowed; slower tiers stay enabled.
    pub max_tier: Option<Tier>,
    /// Tiers to skip even when the host supports them.
    pub disable: Vec<Tier>,
}

impl DispatchConfig {
    pub fn allows(&self, tier: Tier) -> bool {
        if tier == Tier::Scalar {
            return true;
        }
        let under_cap = self.max_tier.is_none_or(|max| tier.rank() <= max.rank());
        under_cap && !self.disable.contains(&tier)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    pub mode: Option<DecodeMode>,
}

impl DecodeConfig {
    /// Lenient unless a layer asked for strict.
    pub fn effective_mode(&self) -> DecodeMode {
        self.mode.unwrap_or_default()
    }
}

/// Settings read from `base64-tiers.toml` files.
///
/// ```toml
/// [dispatch]
/// max_tier = "neon"
/// disable = ["sve"]
///
/// [decode]
/// mode = "strict"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub dispatch: DispatchConfig,
    pub decode: DecodeConfig,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from custom file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load configuration with user overrides from standard locations
    /// 1. Start with built-in defaults (every tier allowed, lenient decode)
    /// 2. Override with ~/.config/base64-tiers/config.toml if it exists
    /// 3. Override with ./base64-tiers.toml if it exists in current directory
    ///
    /// A layer that fails to load is reported and skipped.
    pub fn load_with_overrides() -> Self {
        let mut config = Self::default();

        if let Some(config_dir) = dirs::config_dir() {
            let user_config_path = config_dir.join("base64-tiers").join("config.toml");
            config.merge_layer(&user_config_path);
        }

        config.merge_layer(Path::new("base64-tiers.toml"));
        config
    }

    fn merge_layer(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match Self::load_from_file(path) {
            Ok(layer) => {
                debug!(path = %path.display(), "loaded config layer");
                self.merge(layer);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, skipping");
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// Values set in `other` win. Disabled tiers accumulate across layers.
    pub fn merge(&mut self, other: Config) {
        if other.dispatch.max_tier.is_some() {
            self.dispatch.max_tier = other.dispatch.max_tier;
        }
        for tier in other.dispatch.disable {
            if !self.dispatch.disable.contains(&tier) {
                self.dispatch.disable.push(tier);
            }
        }
        if other.decode.mode.is_some() {
            self.decode.mode = other.decode.mode;
        }
    }

    /// Detected capabilities with this configuration's restrictions applied.
    pub fn capabilities(&self) -> Capabilities {
        simd::detect_capabilities();
        Capabilities::detected().restrict(&self.dispatch)
    }

    pub fn codec(&self) -> Codec {
        Codec::new(self.capabilities())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_toml_string() {
        let toml_content = r#"
[dispatch]
max_tier = "neon"
disable = ["sve", "avx512"]

[decode]
mode = "strict"
"#;
        let config = Config::from_toml(toml_content).unwrap();
        assert_eq!(config.dispatch.max_tier, Some(Tier::Neon));
        assert_eq!(config.dispatch.disable, vec![Tier::Sve, Tier::Avx512Vbmi]);
        assert_eq!(config.decode.effective_mode(), DecodeMode::Strict);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.decode.effective_mode(), DecodeMode::Lenient);
        for tier in Tier::ALL {
            assert!(config.dispatch.allows(tier));
        }
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(
            Config::from_toml("[dispatch]\nmax_teir = \"neon\"\n"),
            Err(ConfigError::Parse(_))
        ));
        let unknown_tier = Config::from_toml("[dispatch]\nmax_tier = \"sse2\"\n");
        assert!(unknown_tier.is_err());
    }

    #[test]
    fn test_max_tier_caps_faster_tiers() {
        let dispatch = DispatchConfig {
            max_tier: Some(Tier::Neon),
            disable: Vec::new(),
        };
        assert!(!dispatch.allows(Tier::Avx512Vbmi));
        assert!(!dispatch.allows(Tier::Sve));
        assert!(dispatch.allows(Tier::Neon));
        assert!(dispatch.allows(Tier::Scalar));
    }

    #[test]
    fn test_scalar_cannot_be_disabled() {
        let dispatch = DispatchConfig {
            max_tier: None,
            disable: vec![Tier::Scalar],
        };
        assert!(dispatch.allows(Tier::Scalar));
    }

    #[test]
    fn test_merge_configs() {
        let mut base = Config::from_toml(
            r#"
[dispatch]
max_tier = "sve"
disable = ["neon"]
"#,
        )
        .unwrap();
        let layer = Config::from_toml(
            r#"
[dispatch]
disable = ["neon", "sve"]

[decode]
mode = "strict"
"#,
        )
        .unwrap();
        base.merge(layer);

        assert_eq!(base.dispatch.max_tier, Some(Tier::Sve));
        assert_eq!(base.dispatch.disable, vec![Tier::Neon, Tier::Sve]);
        assert_eq!(base.decode.mode, Some(DecodeMode::Strict));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch]\nmax_tier = \"scalar\"").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.capabilities(), Capabilities::scalar_only());
        let plan: Vec<Tier> = config.codec().tiers().collect();
        assert_eq!(plan, vec![Tier::Scalar]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load_from_file(Path::new("/nonexistent/base64-tiers.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/base64-tiers.toml"));
    }
}
