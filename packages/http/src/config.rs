//! Where and how to reach the remote's HTTP endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::Error;

pub const DEFAULT_ENDPOINT: &str = "_jigna";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8888".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::new(),
        }
    }
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The full URL requests are sent to: `{base_url}/{endpoint}`.
    pub fn request_url(&self) -> Result<Url, Error> {
        let base = Url::parse(&self.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl {
                message: format!("unsupported scheme '{}' in {}", base.scheme(), base),
            });
        }
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_endpoint() {
        let config = HttpTransportConfig::default();
        assert_eq!(
            config.request_url().unwrap().as_str(),
            "http://localhost:8888/_jigna"
        );
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn base_path_is_kept() {
        let config = HttpTransportConfig::new("https://example.com/app/").with_endpoint("/rpc");
        assert_eq!(
            config.request_url().unwrap().as_str(),
            "https://example.com/app/rpc"
        );
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let config = HttpTransportConfig::new("ftp://example.com");
        assert!(matches!(
            config.request_url(),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[test]
    fn unparseable_base_is_rejected() {
        let config = HttpTransportConfig::new("not a url");
        assert!(matches!(config.request_url(), Err(Error::UrlParse(_))));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: HttpTransportConfig =
            serde_json::from_str(r#"{"base_url": "http://h:1", "headers": {"X-Token": "t"}}"#)
                .unwrap();
        assert_eq!(config.endpoint, "_jigna");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.headers.get("X-Token").map(String::as_str), Some("t"));
    }
}
