// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration.
//!
//! A [`CodecConfig`] is fixed for the lifetime of a codec instance. Defaults:
//!
//! | Setting                 | Default     |
//! |-------------------------|-------------|
//! | `mode`                  | `Xcdr2`     |
//! | `max_collection_length` | `1_000_000` |
//! | `discriminant_policy`   | `Reject`    |
//!
//! With the `config-loaders` feature the same settings can be read from YAML:
//!
//! ```yaml
//! mode: XCDR1
//! max_collection_length: 4096
//! discriminant_policy: EMPTY
//! ```

use crate::encoding::EncodingMode;

/// Upper bound on decoded sequence counts unless configured otherwise.
pub const DEFAULT_MAX_COLLECTION_LENGTH: usize = 1_000_000;

/// What a union decoder does with a discriminator that selects no case and
/// no default arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum DiscriminantPolicy {
    /// Fail with `UnknownDiscriminant`.
    #[default]
    Reject,
    /// Decode as a union with no active member.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub mode: EncodingMode,
    pub max_collection_length: usize,
    pub discriminant_policy: DiscriminantPolicy,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            mode: EncodingMode::Xcdr2,
            max_collection_length: DEFAULT_MAX_COLLECTION_LENGTH,
            discriminant_policy: DiscriminantPolicy::Reject,
        }
    }
}

impl CodecConfig {
    pub fn xcdr1() -> Self {
        Self::default().mode(EncodingMode::Xcdr1)
    }

    pub fn xcdr2() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: EncodingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_collection_length(mut self, max: usize) -> Self {
        self.max_collection_length = max;
        self
    }

    pub fn discriminant_policy(mut self, policy: DiscriminantPolicy) -> Self {
        self.discriminant_policy = policy;
        self
    }
}

#[cfg(feature = "config-loaders")]
mod yaml {
    use super::{CodecConfig, DiscriminantPolicy};
    use crate::encoding::EncodingMode;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;

    /// YAML document form; absent keys keep their defaults.
    #[derive(Debug, Deserialize, Default)]
    #[serde(default, deny_unknown_fields)]
    struct YamlCodecConfig {
        mode: Option<EncodingMode>,
        max_collection_length: Option<usize>,
        discriminant_policy: Option<DiscriminantPolicy>,
    }

    impl CodecConfig {
        /// Parse a configuration from YAML text.
        pub fn from_yaml_str(yaml_content: &str) -> Result<Self, String> {
            let doc: YamlCodecConfig = serde_yaml::from_str(yaml_content)
                .map_err(|e| format!("Failed to parse YAML: {}", e))?;
            let mut config = CodecConfig::default();
            if let Some(mode) = doc.mode {
                config.mode = mode;
            }
            if let Some(max) = doc.max_collection_length {
                config.max_collection_length = max;
            }
            if let Some(policy) = doc.discriminant_policy {
                config.discriminant_policy = policy;
            }
            log::debug!("[cdr] loaded codec config {:?}", config);
            Ok(config)
        }

        pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
            let yaml_content =
                fs::read_to_string(path).map_err(|e| format!("Failed to read YAML file: {}", e))?;
            Self::from_yaml_str(&yaml_content)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::io::Write;

        #[test]
        fn test_parse_full_yaml() {
            let yaml = r#"
mode: XCDR1
max_collection_length: 4096
discriminant_policy: EMPTY
"#;
            let config = CodecConfig::from_yaml_str(yaml).unwrap();
            assert_eq!(config.mode, EncodingMode::Xcdr1);
            assert_eq!(config.max_collection_length, 4096);
            assert_eq!(config.discriminant_policy, DiscriminantPolicy::Empty);
        }

        #[test]
        fn test_empty_document_keeps_defaults() {
            let config = CodecConfig::from_yaml_str("{}").unwrap();
            assert_eq!(config, CodecConfig::default());
        }

        fn write_temp_yaml(content: &str) -> tempfile::NamedTempFile {
            let mut f = tempfile::NamedTempFile::new().expect("create temp file");
            f.write_all(content.as_bytes()).expect("write temp file");
            f.flush().expect("flush temp file");
            f
        }

        #[test]
        fn test_load_from_file() {
            let f = write_temp_yaml("max_collection_length: 12\n");
            let config = CodecConfig::from_yaml_file(f.path()).unwrap();
            assert_eq!(config.max_collection_length, 12);
            assert_eq!(config.mode, EncodingMode::Xcdr2);

            let err = CodecConfig::from_yaml_file("/nonexistent/codec.yaml").unwrap_err();
            assert!(err.starts_with("Failed to read YAML file"));
        }

        #[test]
        fn test_unknown_mode_rejected() {
            let err = CodecConfig::from_yaml_str("mode: XCDR3").unwrap_err();
            assert!(err.starts_with("Failed to parse YAML"));
        }
    }
}
