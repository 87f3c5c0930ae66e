use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::mapping::AttributeMapping;

/// Where the units live in the remote tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Asset server name, matched case-insensitively
    pub server_name: String,
    /// Host of the web API, without scheme; a port is allowed
    pub api_host_name: String,
    pub database_name: String,
    /// Path from the database root to the parent of the units, `\` or `/` delimited
    #[serde(default)]
    pub parent_path: String,
    /// Type template the units must carry
    #[serde(default)]
    pub template_filter: Option<String>,
    /// Display name of the resulting group
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ServerConfig {
    pub fn new(
        server_name: impl Into<String>,
        api_host_name: impl Into<String>,
        database_name: impl Into<String>,
        parent_path: impl Into<String>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            api_host_name: api_host_name.into(),
            database_name: database_name.into(),
            parent_path: parent_path.into(),
            template_filter: None,
            group_name: None,
            location: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template_filter = Some(template.into());
        self
    }

    /// Path segments with empty pieces removed.
    pub fn path_segments(&self) -> Vec<&str> {
        split_path(&self.parent_path)
    }
}

pub fn split_path(path: &str) -> Vec<&str> {
    path.split(['\\', '/'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// One site: which server to talk to and how its attributes are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Profile label, e.g. "north-field"
    pub name: String,
    pub server: ServerConfig,
    pub mapping: AttributeMapping,
}

impl SiteProfile {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let profile: SiteProfile =
            serde_yml::from_str(content).context("Failed to parse site profile YAML")?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.server_name.trim().is_empty() {
            anyhow::bail!("Profile '{}' has no server_name", self.name);
        }
        if self.server.database_name.trim().is_empty() {
            anyhow::bail!("Profile '{}' has no database_name", self.name);
        }
        if self.server.api_host_name.trim().is_empty() {
            anyhow::bail!("Profile '{}' has no api_host_name", self.name);
        }
        if self.mapping.is_empty() {
            anyhow::bail!("Profile '{}' maps no attributes", self.name);
        }
        Ok(())
    }
}
