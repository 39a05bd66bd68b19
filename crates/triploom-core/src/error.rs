use thiserror::Error;

/// Top-level error type for the TripLoom backend.
///
/// Subsystem crates define their own error types and implement
/// `From<TriploomError>` so that the `?` operator works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TriploomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TriploomError {
    fn from(err: toml::de::Error) -> Self {
        TriploomError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TriploomError {
    fn from(err: toml::ser::Error) -> Self {
        TriploomError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TriploomError {
    fn from(err: serde_json::Error) -> Self {
        TriploomError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for TripLoom operations.
pub type Result<T> = std::result::Result<T, TriploomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TriploomError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = TriploomError::Storage("db locked".to_string());
        assert_eq!(err.to_string(), "Storage error: db locked");

        let err = TriploomError::Api("bind failed".to_string());
        assert_eq!(err.to_string(), "API error: bind failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TriploomError = io_err.into();
        assert!(matches!(err, TriploomError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let parse_err = toml::from_str::<toml::Value>("not = = valid").unwrap_err();
        let err: TriploomError = parse_err.into();
        assert!(matches!(err, TriploomError::Config(_)));
    }

    #[test]
    fn test_serde_json_error_maps_to_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: TriploomError = json_err.into();
        assert!(matches!(err, TriploomError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
