use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub mod mapping;
pub mod profile;
pub mod settings;

pub use mapping::{keys, AttributeMapping};
pub use profile::{ServerConfig, SiteProfile};
pub use settings::Settings;

/// Top-level configuration: the site profile plus runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub profile: SiteProfile,
    #[serde(default)]
    pub settings: Settings,
}

impl AppConfig {
    /// Loads a profile file; the `settings:` section is optional.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid profile: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: AppConfig =
            serde_yml::from_str(content).context("Failed to parse profile YAML")?;
        config.profile.validate()?;
        config.apply_env();
        Ok(config)
    }

    /// Environment variables override the file for deployment-specific values.
    fn apply_env(&mut self) {
        if let Ok(host) = env::var("PADSCOPE_API_HOST") {
            self.profile.server.api_host_name = host;
        }
        if let Ok(username) = env::var("PADSCOPE_USERNAME") {
            self.settings.auth.username = Some(username);
        }
        if let Ok(password) = env::var("PADSCOPE_PASSWORD") {
            self.settings.auth.password = Some(password);
        }
        if let Ok(cookie) = env::var("PADSCOPE_COOKIE") {
            self.settings.auth.cookie = Some(cookie);
        }
        if let Some(timeout) = env::var("PADSCOPE_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.settings.connection.request_timeout = timeout;
        }
        if let Some(seed) = env::var("PADSCOPE_SEED").ok().and_then(|s| s.parse().ok()) {
            self.settings.synthetic.seed = Some(seed);
        }
        if let Ok(flag) = env::var("PADSCOPE_ACCEPT_INVALID_CERTS") {
            self.settings.connection.accept_invalid_certs =
                matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn server(&self) -> &ServerConfig {
        &self.profile.server
    }

    pub fn mapping(&self) -> &AttributeMapping {
        &self.profile.mapping
    }
}
