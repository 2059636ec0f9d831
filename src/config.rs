//! Configuration file loading with environment variable overrides.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Default parameter values (used when CLI flags are omitted).
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Gemini API key.
    pub gemini: Option<String>,
}

/// Default parameter values from config file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Model that turns image + instruction into a descriptive prompt.
    pub describe_model: String,
    /// Model that turns the descriptive prompt into an image.
    pub image_model: String,
    /// Default aspect ratio.
    pub aspect_ratio: String,
    /// Default output format.
    pub format: String,
    /// Per-stage timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            describe_model: "gemini-flash".to_string(),
            image_model: "imagen-4".to_string(),
            aspect_ratio: "1:1".to_string(),
            format: "jpeg".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Resolve the API key once, preferring the environment variable.
    #[must_use]
    pub fn api_key(&self) -> ApiKey {
        ApiKey::resolve(std::env::var(API_KEY_ENV).ok(), self.keys.gemini.clone())
    }
}

/// How usable the configured credential looks before any call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    /// A non-placeholder key is set.
    Present,
    /// No key, or only whitespace.
    Missing,
    /// A template value such as `YOUR_API_KEY` was left in place.
    Placeholder,
}

const PLACEHOLDERS: &[&str] =
    &["your_api_key", "your-api-key", "placeholder_api_key", "api_key", "changeme", "xxx"];

/// The Gemini API credential, injected into the live adapters at startup.
///
/// Only presence is checked here; whether the key is accepted is decided by
/// the service's own error response.
#[derive(Clone, Default)]
pub struct ApiKey(String);

impl ApiKey {
    /// Pick the environment value over the file value, ignoring blank entries.
    #[must_use]
    pub fn resolve(env: Option<String>, file: Option<String>) -> Self {
        let pick = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self(pick(env).or_else(|| pick(file)).map(|s| s.trim().to_string()).unwrap_or_default())
    }

    /// Classify the key without contacting the service.
    #[must_use]
    pub fn status(&self) -> CredentialStatus {
        let key = self.0.as_str();
        if key.is_empty() {
            return CredentialStatus::Missing;
        }
        let lower = key.to_ascii_lowercase();
        let is_template = PLACEHOLDERS.contains(&lower.as_str())
            || lower.starts_with("your_")
            || lower.starts_with("your-")
            || (key.starts_with('<') && key.ends_with('>'));
        if is_template {
            CredentialStatus::Placeholder
        } else {
            CredentialStatus::Present
        }
    }

    /// Warning to show for an unusable key, if any.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        match self.status() {
            CredentialStatus::Present => None,
            CredentialStatus::Missing => Some(format!(
                "No API key configured. Set {API_KEY_ENV} or add [keys] gemini to the config file; \
                 requests will be rejected by the service."
            )),
            CredentialStatus::Placeholder => Some(format!(
                "The API key looks like a placeholder. Set {API_KEY_ENV} to a real key; \
                 requests will likely be rejected by the service."
            )),
        }
    }

    /// The raw key, for request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({:?})", self.status())
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `REIMAGINE_CONFIG` environment variable
/// 3. `~/.config/reimagine/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("REIMAGINE_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/reimagine/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/reimagine/config.toml")
    } else {
        PathBuf::from("reimagine.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.keys.gemini.is_none());
        assert_eq!(config.defaults.describe_model, "gemini-flash");
        assert_eq!(config.defaults.image_model, "imagen-4");
        assert_eq!(config.defaults.aspect_ratio, "1:1");
        assert_eq!(config.defaults.format, "jpeg");
        assert_eq!(config.defaults.timeout_secs, 120);
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.defaults.image_model, "imagen-4");
    }

    #[test]
    fn load_partial_defaults_table() {
        let dir = std::env::temp_dir().join("reimagine_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[keys]
gemini = "test-gemini-key"

[defaults]
image_model = "nano-banana"
timeout_secs = 30
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys.gemini.as_deref(), Some("test-gemini-key"));
        assert_eq!(config.defaults.image_model, "nano-banana");
        assert_eq!(config.defaults.timeout_secs, 30);
        assert_eq!(config.defaults.describe_model, "gemini-flash");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_invalid_toml() {
        let dir = std::env::temp_dir().join("reimagine_config_bad_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn env_key_wins_over_file() {
        let key = ApiKey::resolve(Some("from-env".into()), Some("from-file".into()));
        assert_eq!(key.expose(), "from-env");
    }

    #[test]
    fn blank_env_key_falls_back_to_file() {
        let key = ApiKey::resolve(Some("  ".into()), Some("from-file".into()));
        assert_eq!(key.expose(), "from-file");
    }

    #[test]
    fn missing_key_warns() {
        let key = ApiKey::resolve(None, None);
        assert_eq!(key.status(), CredentialStatus::Missing);
        assert!(key.warning().unwrap().contains(API_KEY_ENV));
    }

    #[test]
    fn placeholder_keys_are_recognized() {
        for raw in ["YOUR_API_KEY", "PLACEHOLDER_API_KEY", "<api-key>", "your-gemini-key"] {
            let key = ApiKey::resolve(Some(raw.into()), None);
            assert_eq!(key.status(), CredentialStatus::Placeholder, "{raw}");
            assert!(key.warning().is_some());
        }
    }

    #[test]
    fn short_real_looking_key_is_present() {
        // Presence only: length is not a validity signal.
        let key = ApiKey::resolve(Some("abc".into()), None);
        assert_eq!(key.status(), CredentialStatus::Present);
        assert!(key.warning().is_none());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = ApiKey::resolve(Some("secret-value".into()), None);
        assert!(!format!("{key:?}").contains("secret-value"));
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
