//! RON settings files
//!
//! Every settings struct in the editor crates derives serde and is stored
//! as pretty-printed RON through these helpers.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors from reading or writing settings
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Serialize settings to a RON string
pub fn to_ron_string<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|e| ConfigError::Serialize(e.to_string()))
}

/// Parse settings from a RON string
pub fn from_ron_str<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
}

/// Save settings to a file
pub fn save_ron<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let content = to_ron_string(value)?;
    std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
    tracing::debug!("Saved settings to {}", path.display());
    Ok(())
}

/// Load settings from a file
pub fn load_ron<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    from_ron_str(&content)
}
