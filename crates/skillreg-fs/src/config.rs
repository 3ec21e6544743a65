//! Configuration files in TOML, JSON or YAML, chosen by extension

use crate::{Error, NormalizedPath, Result, io};
use serde::{Serialize, de::DeserializeOwned};

/// A serialization format recognized by [`ConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the extension of `path`, ignoring case.
    pub fn from_path(path: &NormalizedPath) -> Result<Self> {
        let extension = path.extension().unwrap_or_default();
        match extension.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    fn decode<T: DeserializeOwned>(self, content: &str) -> std::result::Result<T, String> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn encode<T: Serialize>(self, value: &T) -> std::result::Result<String, String> {
        match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        }
    }
}

/// Loads and saves serde types, picking the format from the file extension.
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Read and decode `path`.
    ///
    /// Parse failures carry the path and format name so the user can find
    /// the offending file.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let format = ConfigFormat::from_path(path)?;
        let content = io::read_text(path)?;
        format.decode(&content).map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })
    }

    /// Encode `value` and write it atomically.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let format = ConfigFormat::from_path(path)?;
        let content = format.encode(value).map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })?;
        io::write_atomic(path, content.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ignores_extension_case() {
        let path = NormalizedPath::new("conf/skillreg.TOML");
        assert_eq!(ConfigFormat::from_path(&path).unwrap(), ConfigFormat::Toml);
        let path = NormalizedPath::new("conf/skillreg.yml");
        assert_eq!(ConfigFormat::from_path(&path).unwrap(), ConfigFormat::Yaml);
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let path = NormalizedPath::new("conf/skillreg");
        assert!(matches!(
            ConfigFormat::from_path(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
