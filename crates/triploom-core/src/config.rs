use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TriploomError};

/// Top-level configuration for the TripLoom backend.
///
/// Loaded from `~/.triploom/config.toml` by default. Secrets (the model API
/// key and the JWT signing secret) are never read from or written to the
/// file; they only come from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriploomConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl TriploomConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TriploomConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored. Recognized keys: `PORT`, `OPENAI_API_KEY`,
    /// `OPENAI_MODEL_DEFAULT`, `OPENAI_BASE_URL`, `NEXT_API_BASE_URL`,
    /// `ALLOWED_ORIGINS`, `TRIPLOOM_STORAGE`, `TRIPLOOM_AUTH_MODE`,
    /// `TRIPLOOM_JWT_SECRET`, `TRIPLOOM_JWT_ISSUER`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid PORT override"),
            }
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.model.api_key = v;
        }
        if let Some(v) = get("OPENAI_MODEL_DEFAULT") {
            self.model.default_model = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.model.base_url = v;
        }
        if let Some(v) = get("NEXT_API_BASE_URL") {
            self.bridge.base_url = v;
        }
        if let Some(v) = get("ALLOWED_ORIGINS") {
            self.server.allowed_origins = v;
        }
        if let Some(v) = get("TRIPLOOM_STORAGE") {
            self.storage.backend = v;
        }
        if let Some(v) = get("TRIPLOOM_AUTH_MODE") {
            self.auth.mode = v;
        }
        if let Some(v) = get("TRIPLOOM_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = get("TRIPLOOM_JWT_ISSUER") {
            self.auth.issuer = v;
        }
    }

    /// Check that the configuration is usable for serving requests.
    pub fn validate(&self) -> Result<()> {
        if self.model.api_key.trim().is_empty() {
            return Err(TriploomError::Config("OPENAI_API_KEY is required".into()));
        }
        match self.storage.backend.as_str() {
            "memory" | "sqlite" => {}
            other => {
                return Err(TriploomError::Config(format!(
                    "unknown storage backend '{}', expected 'memory' or 'sqlite'",
                    other
                )))
            }
        }
        match self.auth.mode.as_str() {
            "test" => {}
            "jwt" => {
                if self.auth.jwt_secret.trim().is_empty() {
                    return Err(TriploomError::Config(
                        "TRIPLOOM_JWT_SECRET is required when auth mode is 'jwt'".into(),
                    ));
                }
            }
            other => {
                return Err(TriploomError::Config(format!(
                    "unknown auth mode '{}', expected 'test' or 'jwt'",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Allowed CORS origins as a list.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.server
            .allowed_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.triploom/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated list of CORS origins.
    pub allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: "http://localhost:3000".to_string(),
        }
    }
}

/// Language model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub default_model: String,
    pub timeout_secs: u64,
    /// Transport-level retries performed by the provider client.
    pub max_retries: u32,
    #[serde(skip)]
    pub api_key: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-5-mini".to_string(),
            timeout_secs: 45,
            max_retries: 2,
            api_key: String::new(),
        }
    }
}

/// Sibling web service bridge (flight status, transit suggestions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Persistence backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// "memory" or "sqlite".
    pub backend: String,
    /// Database file name, relative to `general.data_dir`.
    pub db_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            db_file: "triploom.db".to_string(),
        }
    }
}

/// Request authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// "test" (X-User-Id passthrough) or "jwt" (HS256 bearer tokens).
    pub mode: String,
    /// Expected issuer prefix; empty disables the check.
    pub issuer: String,
    #[serde(skip)]
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: "test".to_string(),
            issuer: String::new(),
            jwt_secret: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = TriploomConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origins, "http://localhost:3000");
        assert_eq!(config.model.default_model, "gpt-5-mini");
        assert_eq!(config.model.timeout_secs, 45);
        assert_eq!(config.model.max_retries, 2);
        assert_eq!(config.bridge.base_url, "http://localhost:3000");
        assert_eq!(config.bridge.timeout_secs, 15);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.auth.mode, "test");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config(
            r#"
[server]
port = 9090

[model]
default_model = "gpt-5"
"#,
        );
        let config = TriploomConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.default_model, "gpt-5");
        assert_eq!(config.model.timeout_secs, 45);
        assert_eq!(config.storage.backend, "memory");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(TriploomConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = TriploomConfig::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut config = TriploomConfig::default();
        config.model.api_key = "sk-secret".to_string();
        config.auth.jwt_secret = "jwt-secret".to_string();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("sk-secret"));
        assert!(!toml_str.contains("jwt-secret"));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        TriploomConfig::default().save(&path).unwrap();
        let reloaded = TriploomConfig::load(&path).unwrap();
        assert_eq!(reloaded.model.default_model, "gpt-5-mini");
    }

    #[test]
    fn test_overrides_apply_non_empty_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9000"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL_DEFAULT", "gpt-5"),
            ("NEXT_API_BASE_URL", "http://bridge:3000"),
            ("ALLOWED_ORIGINS", ""),
        ]);
        let mut config = TriploomConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.model.api_key, "sk-test");
        assert_eq!(config.model.default_model, "gpt-5");
        assert_eq!(config.bridge.base_url, "http://bridge:3000");
        assert_eq!(config.server.allowed_origins, "http://localhost:3000");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = TriploomConfig::default();
        config.apply_overrides_from(|k| (k == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = TriploomConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_validate_jwt_mode_requires_secret() {
        let mut config = TriploomConfig::default();
        config.model.api_key = "sk-test".to_string();
        config.auth.mode = "jwt".to_string();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let mut config = TriploomConfig::default();
        config.model.api_key = "sk-test".to_string();
        config.storage.backend = "postgres".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_allowed_origins_split() {
        let mut config = TriploomConfig::default();
        config.server.allowed_origins = "http://a.test, http://b.test,,".to_string();
        assert_eq!(
            config.allowed_origins(),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
