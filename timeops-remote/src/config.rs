use serde::Serialize;

use crate::client::RemoteError;
use crate::ApiUrl;

/// Connection settings for the remote API, passed explicitly to
/// [`crate::RemoteClient::new`].
#[derive(Debug, Clone, Serialize)]
pub struct RemoteConfig {
    base_url: String,
    token: String,
}

impl RemoteConfig {
    /// Builds a config from a stored base URL and bearer token. Both must be
    /// present and non-empty; a trailing slash on the URL is stripped.
    pub fn new(
        base_url: Option<String>,
        token: Option<String>,
    ) -> Result<RemoteConfig, RemoteError> {
        match (base_url, token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => Ok(RemoteConfig {
                base_url: url.trim_end_matches('/').to_string(),
                token,
            }),
            _ => Err(RemoteError::Configuration),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn api_url(&self) -> ApiUrl {
        ApiUrl::new(&self.base_url)
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash() {
        let config = RemoteConfig::new(
            Some("http://localhost:3000/".to_string()),
            Some("secret".to_string()),
        )
        .unwrap();
        assert_eq!(config.base_url(), "http://localhost:3000");
    }

    #[test]
    fn rejects_missing_pieces() {
        assert!(matches!(
            RemoteConfig::new(None, Some("secret".to_string())),
            Err(RemoteError::Configuration)
        ));
        assert!(matches!(
            RemoteConfig::new(Some("http://localhost".to_string()), Some(String::new())),
            Err(RemoteError::Configuration)
        ));
    }
}
