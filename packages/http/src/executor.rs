//! HTTP execution abstraction for testing.
//!
//! The transport only ever issues one kind of call, a GET carrying the
//! encoded request in the `data` query parameter. This trait isolates that
//! call so tests can script the remote without a network.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::Error;

/// Executes the transport's GET requests.
pub trait RequestExecutor: Send + Sync {
    /// GET `url?data=<data>` and return the body of a successful response.
    fn get(&self, url: &Url, data: &str) -> Result<String, Error>;
}

/// Production executor using a blocking reqwest client.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Create an executor with the given timeout and default headers.
    pub fn new(timeout: Duration, headers: &BTreeMap<String, String>) -> Result<Self, Error> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            let invalid = |message: String| Error::InvalidHeader {
                name: name.clone(),
                message,
            };
            let header_name =
                HeaderName::try_from(name.as_str()).map_err(|e| invalid(e.to_string()))?;
            let header_value =
                HeaderValue::try_from(value.as_str()).map_err(|e| invalid(e.to_string()))?;
            default_headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()?;

        Ok(Self { client })
    }

    /// Create with default timeout of 30 seconds and no extra headers.
    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(Duration::from_secs(30), &BTreeMap::new())
    }
}

impl RequestExecutor for ReqwestExecutor {
    fn get(&self, url: &Url, data: &str) -> Result<String, Error> {
        let response = self.client.get(url.clone()).query(&[("data", data)]).send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reqwest_executor_creation() {
        assert!(ReqwestExecutor::with_default_timeout().is_ok());
    }

    #[test]
    fn reqwest_executor_with_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Session".to_string(), "abc".to_string());
        assert!(ReqwestExecutor::new(Duration::from_secs(5), &headers).is_ok());
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        let result = ReqwestExecutor::new(Duration::from_secs(5), &headers);
        assert!(matches!(
            result,
            Err(Error::InvalidHeader { name, .. }) if name == "bad header"
        ));
    }
}
