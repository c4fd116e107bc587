//! Layered configuration for the opsboard service.
//!
//! Settings come from three layers, later layers winning:
//! 1. `opsboard.toml` in the working directory (optional)
//! 2. `OPSBOARD_*` environment variables (secrets usually land here via
//!    a `.env` file loaded at startup)
//! 3. CLI flags on `opsboard serve`
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! port = 5000
//! dev = false
//!
//! [repo]
//! owner = "acme-controls"
//! name = "team-tracker-data"
//!
//! [connector]
//! hostname = "connectors.example.com"
//!
//! [attendance]
//! share_link = "https://contoso-my.sharepoint.com/:x:/g/personal/...."
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "opsboard.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Port the HTTP API binds to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Dev mode: bind 0.0.0.0 and allow permissive CORS for a local UI dev
    /// server.
    #[serde(default)]
    pub dev: bool,
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            dev: false,
        }
    }
}

/// The GitHub repository holding the JSON documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoSection {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub name: String,
}

/// Hosted-connector token exchange. A directly configured `github_token`
/// bypasses the exchange entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorSection {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub identity_token: Option<String>,
    #[serde(default)]
    pub renewal_token: Option<String>,
    #[serde(default)]
    pub github_token: Option<String>,
}

/// Attendance workbook access via a Microsoft Graph share link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceSection {
    #[serde(default)]
    pub share_link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub repo: RepoSection,
    #[serde(default)]
    pub connector: ConnectorSection,
    #[serde(default)]
    pub attendance: AttendanceSection,
}

impl OpsConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse opsboard.toml")
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist. Environment overrides are applied on top.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        let mut config = if config_path.exists() {
            Self::load(&config_path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize opsboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `OPSBOARD_*` environment overrides on top of file settings.
    pub fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("OPSBOARD_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }
        if let Ok(dev) = std::env::var("OPSBOARD_DEV") {
            self.server.dev = dev != "false" && !dev.is_empty();
        }
        if let Ok(owner) = std::env::var("OPSBOARD_REPO_OWNER") {
            self.repo.owner = owner;
        }
        if let Ok(name) = std::env::var("OPSBOARD_REPO_NAME") {
            self.repo.name = name;
        }
        if let Ok(hostname) = std::env::var("OPSBOARD_CONNECTOR_HOSTNAME") {
            self.connector.hostname = Some(hostname);
        }
        if let Ok(token) = std::env::var("OPSBOARD_IDENTITY_TOKEN") {
            self.connector.identity_token = Some(token);
        }
        if let Ok(token) = std::env::var("OPSBOARD_RENEWAL_TOKEN") {
            self.connector.renewal_token = Some(token);
        }
        if let Ok(token) = std::env::var("OPSBOARD_GITHUB_TOKEN") {
            self.connector.github_token = Some(token);
        }
        if let Ok(link) = std::env::var("OPSBOARD_ATTENDANCE_SHARE_LINK") {
            self.attendance.share_link = Some(link);
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.repo.owner.is_empty() || self.repo.name.is_empty() {
            warnings.push(
                "repo.owner/repo.name are not set; the JSON store will be unreachable \
                 (run with --offline for an in-memory store)"
                    .to_string(),
            );
        }
        if self.connector.github_token.is_none()
            && (self.connector.hostname.is_none()
                || (self.connector.identity_token.is_none()
                    && self.connector.renewal_token.is_none()))
        {
            warnings.push(
                "no github_token and no usable connector exchange configured; \
                 store reads will degrade to empty defaults"
                    .to_string(),
            );
        }
        if self.attendance.share_link.is_none() {
            warnings.push("attendance.share_link not set; performance scores will omit attendance".to_string());
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_gives_defaults() {
        let config = OpsConfig::parse("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert!(!config.server.dev);
        assert!(config.repo.owner.is_empty());
        assert!(config.connector.github_token.is_none());
    }

    #[test]
    fn parse_partial_sections() {
        let config = OpsConfig::parse(
            r#"
            [server]
            port = 8080

            [repo]
            owner = "acme-controls"
            name = "team-tracker-data"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.repo.owner, "acme-controls");
        assert_eq!(config.repo.name, "team-tracker-data");
    }

    #[test]
    fn parse_rejects_malformed_toml() {
        assert!(OpsConfig::parse("[server\nport = ").is_err());
    }

    #[test]
    fn validate_warns_on_missing_repo() {
        let config = OpsConfig::default();
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("repo.owner")));
    }

    #[test]
    fn validate_quiet_when_fully_configured() {
        let mut config = OpsConfig::default();
        config.repo.owner = "acme-controls".into();
        config.repo.name = "team-tracker-data".into();
        config.connector.github_token = Some("ghp_test".into());
        config.attendance.share_link = Some("https://example.test/share".into());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = OpsConfig::default();
        config.server.port = 4321;
        config.repo.owner = "acme-controls".into();
        config.save(&path).unwrap();

        let loaded = OpsConfig::load(&path).unwrap();
        assert_eq!(loaded.server.port, 4321);
        assert_eq!(loaded.repo.owner, "acme-controls");
    }
}
