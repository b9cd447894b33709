use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdeConfig {
    /// Root endpoint of the filesystem backend (e.g., https://files.example.com/api)
    #[serde(rename = "baseURL")]
    pub base_url: String,

    /// Credential handed to the embedded application by its host
    pub auth_cookie: String,

    /// Origins allowed to post messages to the embedded application
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl KdeConfig {
    pub fn new(
        base_url: impl Into<String>,
        auth_cookie: impl Into<String>,
        allowed_origins: Vec<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            auth_cookie: auth_cookie.into(),
            allowed_origins,
        }
    }

    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("org", "kde-sdk", "kde") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("kde-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Query string the credential is read back from during initialization
    pub fn auth_query(&self) -> String {
        format!("?{}={}", crate::auth::COOKIE_PARAM, self.auth_cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = KdeConfig::new(
            "https://files.test/api",
            "abc123",
            vec!["https://host.test".to_string()],
        );
        config.save(&path).unwrap();
        assert_eq!(KdeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_wire_field_names() {
        let config = KdeConfig::new("https://files.test", "c", vec![]);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "baseURL": "https://files.test",
                "authCookie": "c",
                "allowedOrigins": []
            })
        );
    }

    #[test]
    fn test_allowed_origins_default() {
        let config: KdeConfig =
            serde_json::from_str(r#"{"baseURL": "http://x", "authCookie": "c"}"#).unwrap();
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = KdeConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_auth_query() {
        let config = KdeConfig::new("http://x", "tok", vec![]);
        assert_eq!(config.auth_query(), "?cookie=tok");
    }

    #[test]
    fn test_default_path_is_json() {
        let path = KdeConfig::default_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
    }
}
