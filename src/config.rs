//! Configuration file support
//!
//! Every section is optional; missing sections and fields use defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::convert::StyleParams;
use crate::encode::EncodeSettings;
use crate::transcribe::TranscribeConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default style for converted captions
    pub style: StyleParams,
    pub transcription: TranscribeConfig,
    pub encode: EncodeSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Load `path` if given, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config {}", path.as_ref().display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::WhisperModel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[style]\nfont = \"Verdana\"\nalignment = 8\n\n[transcription]\nmodel = \"small\"\nmax_words_per_segment = 5\n"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.style.font, "Verdana");
        assert_eq!(config.style.alignment, 8);
        assert_eq!(config.style.font_size, StyleParams::default().font_size);
        assert_eq!(config.transcription.model, WhisperModel::Small);
        assert_eq!(config.transcription.max_words_per_segment, Some(5));
        assert_eq!(config.encode, EncodeSettings::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_file_roundtrip() {
        let mut config = AppConfig::default();
        config.transcription.max_segment_duration = Some(4.5);
        config.encode.crf = 18;

        let file = NamedTempFile::new().unwrap();
        config.to_file(file.path()).unwrap();
        assert_eq!(AppConfig::from_file(file.path()).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[style]\nfont_size = \"big\"").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
        assert!(AppConfig::load(None).is_ok());
    }
}
