//! Marshaling configuration.
//!
//! With the `config` feature the configuration can be loaded from TOML:
//!
//! ```toml
//! byte-order = "little"
//! null-pointers = "omit"
//! ```

#[cfg(feature = "config")]
use serde::Deserialize;
#[cfg(feature = "config")]
use std::path::Path;

/// Byte order used when native scalars are copied to or from raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Deserialize), serde(rename_all = "kebab-case"))]
pub enum ByteOrder {
    /// Host byte order, the layout the native side actually wrote.
    #[default]
    Native,
    Little,
    Big,
}

/// What the resolver produces for a null pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Deserialize), serde(rename_all = "kebab-case"))]
pub enum NullPointerPolicy {
    /// Keep the entry and resolve it to [`ResolvedValue::Absent`](crate::ResolvedValue::Absent).
    #[default]
    Absent,
    /// Drop the entry from the enclosing mapping. Outside a mapping the
    /// value still resolves to `Absent`.
    Omit,
}

/// Settings shared by the resolver and the record marshaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "config",
    derive(Deserialize),
    serde(default, rename_all = "kebab-case", deny_unknown_fields)
)]
pub struct MarshalConfig {
    /// Byte order for scalar arrays copied into byte sequences.
    pub byte_order: ByteOrder,
    /// Null pointer handling during resolution.
    pub null_pointers: NullPointerPolicy,
}

impl MarshalConfig {
    /// Set the byte order for scalar arrays.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set the null pointer policy.
    pub fn with_null_pointers(mut self, policy: NullPointerPolicy) -> Self {
        self.null_pointers = policy;
        self
    }
}

#[cfg(feature = "config")]
impl MarshalConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// Configuration error.
#[cfg(feature = "config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),
    /// TOML parse error.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(all(test, feature = "config"))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml = r#"
byte-order = "big"
null-pointers = "omit"
"#;
        let config = MarshalConfig::from_str(toml).unwrap();
        assert_eq!(config.byte_order, ByteOrder::Big);
        assert_eq!(config.null_pointers, NullPointerPolicy::Omit);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = MarshalConfig::from_str("").unwrap();
        assert_eq!(config, MarshalConfig::default());

        let config = MarshalConfig::from_str("byte-order = \"little\"").unwrap();
        assert_eq!(config.byte_order, ByteOrder::Little);
        assert_eq!(config.null_pointers, NullPointerPolicy::Absent);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = MarshalConfig::from_str("endianness = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "null-pointers = \"absent\"").unwrap();
        writeln!(file, "byte-order = \"native\"").unwrap();
        let config = MarshalConfig::from_file(file.path()).unwrap();
        assert_eq!(config, MarshalConfig::default());

        let missing = MarshalConfig::from_file("/nonexistent/ffi-marshal.toml").unwrap_err();
        assert!(missing.to_string().contains("/nonexistent/ffi-marshal.toml"));
    }
}
