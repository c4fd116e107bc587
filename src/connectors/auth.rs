//! Hosted-connector token exchange.
//!
//! Access tokens for the GitHub and SharePoint connectors are minted by a
//! hosted connector service: one GET per connector name returns the current
//! OAuth settings, which are cached here until their `expires_at`. A token
//! configured directly (e.g. `OPSBOARD_GITHUB_TOKEN`) short-circuits the
//! exchange for that connector.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::ConnectorSection;
use crate::errors::ConnectorError;

#[derive(Debug, Deserialize)]
struct ConnectionList {
    #[serde(default)]
    items: Vec<ConnectionItem>,
}

#[derive(Debug, Deserialize)]
struct ConnectionItem {
    #[serde(default)]
    settings: ConnectionSettings,
}

#[derive(Debug, Default, Deserialize)]
struct ConnectionSettings {
    access_token: Option<String>,
    expires_at: Option<String>,
    #[serde(default)]
    oauth: Option<OauthSettings>,
}

#[derive(Debug, Deserialize)]
struct OauthSettings {
    credentials: Option<OauthCredentials>,
}

#[derive(Debug, Deserialize)]
struct OauthCredentials {
    access_token: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry > now,
            None => false,
        }
    }
}

/// Per-connector access-token source with an expiry cache.
pub struct TokenProvider {
    client: reqwest::Client,
    hostname: Option<String>,
    identity_token: Option<String>,
    renewal_token: Option<String>,
    overrides: HashMap<&'static str, String>,
    cache: Mutex<HashMap<String, CachedToken>>,
}

impl TokenProvider {
    pub fn from_config(connector: &ConnectorSection) -> Self {
        let mut overrides = HashMap::new();
        if let Some(token) = &connector.github_token {
            overrides.insert("github", token.clone());
        }
        Self {
            client: reqwest::Client::new(),
            hostname: connector.hostname.clone(),
            identity_token: connector.identity_token.clone(),
            renewal_token: connector.renewal_token.clone(),
            overrides,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The `X_REPLIT_TOKEN` header value: a workspace identity wins over a
    /// deployment renewal token.
    fn exchange_header(&self) -> Result<String, ConnectorError> {
        if let Some(identity) = &self.identity_token {
            return Ok(format!("repl {}", identity));
        }
        if let Some(renewal) = &self.renewal_token {
            return Ok(format!("depl {}", renewal));
        }
        Err(ConnectorError::IdentityMissing)
    }

    /// Fetch (or reuse) the access token for a named connector.
    pub async fn access_token(&self, connector: &'static str) -> Result<String, ConnectorError> {
        if let Some(token) = self.overrides.get(connector) {
            return Ok(token.clone());
        }

        let now = Utc::now();
        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(connector)
                && cached.is_fresh(now)
            {
                return Ok(cached.access_token.clone());
            }
        }

        let hostname = self
            .hostname
            .as_deref()
            .ok_or(ConnectorError::HostnameMissing)?;
        let header = self.exchange_header()?;

        let url = format!(
            "https://{}/api/v2/connection?include_secrets=true&connector_names={}",
            hostname, connector
        );
        let list: ConnectionList = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X_REPLIT_TOKEN", header)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let settings = list
            .items
            .into_iter()
            .next()
            .map(|item| item.settings)
            .ok_or(ConnectorError::NotConnected { connector })?;

        let access_token = settings
            .access_token
            .clone()
            .or_else(|| {
                settings
                    .oauth
                    .as_ref()
                    .and_then(|oauth| oauth.credentials.as_ref())
                    .and_then(|creds| creds.access_token.clone())
            })
            .ok_or(ConnectorError::NotConnected { connector })?;

        let expires_at = settings
            .expires_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc));

        let mut cache = self.cache.lock().await;
        cache.insert(
            connector.to_string(),
            CachedToken {
                access_token: access_token.clone(),
                expires_at,
            },
        );

        Ok(access_token)
    }
}
