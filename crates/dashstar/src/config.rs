use std::time::Duration;

use crate::prelude::*;

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Default API root of a locally running backend
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8080/api";

    /// Load configuration from environment variables
    ///
    /// Uses DASHSTAR_BASE_URL with default fallback
    /// Uses DASHSTAR_TOKEN if set
    /// Uses DASHSTAR_TIMEOUT (seconds) if set
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout = lookup("DASHSTAR_TIMEOUT")
            .map(|raw| parse_timeout(&raw))
            .transpose()?;

        Ok(Self {
            base_url: lookup("DASHSTAR_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            token: lookup("DASHSTAR_TOKEN").filter(|token| !token.is_empty()),
            timeout,
        })
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        token: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(token) = token {
            self.token = Some(token);
        }
        if let Some(secs) = timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        self
    }

    /// Use `token` only when no token was configured explicitly
    pub fn with_fallback_token(mut self, token: Option<String>) -> Self {
        if self.token.is_none() {
            self.token = token;
        }
        self
    }

    /// Base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| {
            Error::Config(format!(
                "DASHSTAR_TIMEOUT must be a whole number of seconds, got {raw:?}"
            ))
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.base_url, ClientConfig::DEFAULT_BASE_URL);
        assert_eq!(config.token, None);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_from_vars() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("DASHSTAR_BASE_URL", "https://blog.example.com/api/"),
            ("DASHSTAR_TOKEN", "secret"),
            ("DASHSTAR_TIMEOUT", "15"),
        ]))
        .unwrap();

        assert_eq!(config.api_base(), "https://blog.example.com/api");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_invalid_timeout() {
        let result = ClientConfig::from_lookup(lookup(&[("DASHSTAR_TIMEOUT", "soon")]));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("DASHSTAR_TIMEOUT"));
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[("DASHSTAR_TOKEN", "")])).unwrap();
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[("DASHSTAR_TOKEN", "env")]))
            .unwrap()
            .with_overrides(Some("http://other/api".into()), Some("flag".into()), Some(3));

        assert_eq!(config.base_url, "http://other/api");
        assert_eq!(config.token.as_deref(), Some("flag"));
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_fallback_token() {
        let base = ClientConfig::from_lookup(lookup(&[])).unwrap();

        let from_session = base.clone().with_fallback_token(Some("session".into()));
        assert_eq!(from_session.token.as_deref(), Some("session"));

        let explicit = base
            .with_overrides(None, Some("flag".into()), None)
            .with_fallback_token(Some("session".into()));
        assert_eq!(explicit.token.as_deref(), Some("flag"));
    }
}
