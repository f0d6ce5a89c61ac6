//! Document encodings
//!
//! Documents are JSON by default. YAML and TOML are chosen by file extension.

use serde_json::Value;
use std::path::Path;

/// Error while encoding or decoding a stored document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[cfg(feature = "toml-format")]
    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[cfg(feature = "toml-format")]
    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
    #[error("Document root must be a mapping")]
    NotAMapping,
}

/// Serialization format of a stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    #[cfg(feature = "toml-format")]
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a path's extension. Paths without an extension are JSON.
    pub fn from_path(path: &str) -> Result<Self, DocumentError> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            None | Some("json") => Ok(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            #[cfg(feature = "toml-format")]
            Some("toml") => Ok(DocumentFormat::Toml),
            Some(other) => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn encode(self, value: &Value) -> Result<Vec<u8>, DocumentError> {
        match self {
            DocumentFormat::Json => Ok(serde_json::to_vec_pretty(value)?),
            DocumentFormat::Yaml => Ok(serde_yaml::to_string(value)?.into_bytes()),
            #[cfg(feature = "toml-format")]
            DocumentFormat::Toml => Ok(toml::to_string_pretty(value)?.into_bytes()),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Value, DocumentError> {
        let value: Value = match self {
            DocumentFormat::Json => serde_json::from_slice(bytes)?,
            DocumentFormat::Yaml => serde_yaml::from_slice(bytes)?,
            #[cfg(feature = "toml-format")]
            DocumentFormat::Toml => toml::from_str(&String::from_utf8(bytes.to_vec())?)?,
        };
        if !value.is_object() {
            return Err(DocumentError::NotAMapping);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path("a.json").unwrap(), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path("a.YML").unwrap(), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path("config").unwrap(), DocumentFormat::Json);
        assert!(matches!(
            DocumentFormat::from_path("a.xml"),
            Err(DocumentError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_yaml_keeps_document_order() {
        let value = json!({"general": {"design_name": "D"}, "variables": {"W": "1mm", "A": "W*2"}});
        let bytes = DocumentFormat::Yaml.encode(&value).unwrap();
        let back = DocumentFormat::Yaml.decode(&bytes).unwrap();

        let keys: Vec<&String> = back["variables"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["W", "A"]);
    }

    #[cfg(feature = "toml-format")]
    #[test]
    fn test_toml_document() {
        let value = json!({"general": {"design_name": "D", "model_units": "mm"}, "variables": {"L": "10mm"}});
        let bytes = DocumentFormat::Toml.encode(&value).unwrap();
        let back = DocumentFormat::Toml.decode(&bytes).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_non_mapping_root_rejected() {
        assert!(matches!(
            DocumentFormat::Json.decode(b"[1, 2]"),
            Err(DocumentError::NotAMapping)
        ));
    }
}
