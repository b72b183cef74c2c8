pub mod normalize;
pub mod record;
pub mod transport;

use std::time::Duration;

pub use moviefetch_core::{
    DownloadSelector, FieldMap, FieldValue, LookupError, RecordError, TransportError,
};
pub use record::MovieRecord;
pub use transport::{HttpTransport, Transport};

pub const DEFAULT_URL: &str = "http://www.omdbapi.com/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Query parameter carrying the search string.
pub const QUERY_PARAM: &str = "t";
/// Query parameter carrying the service API key.
pub const API_KEY_PARAM: &str = "apikey";

/// Where and how the primary lookup is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub timeout: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            params: vec![
                ("r".to_string(), "json".to_string()),
                ("plot".to_string(), "full".to_string()),
            ],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RequestConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a query parameter, replacing any previous value for `key`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.params.retain(|(k, _)| *k != key);
        self.params.push((key, value.into()));
        self
    }

    /// Configured parameters with the search string merged in.
    pub fn query_params(&self, query: &str) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .params
            .iter()
            .filter(|(k, _)| k != QUERY_PARAM)
            .cloned()
            .collect();
        params.push((QUERY_PARAM.to_string(), query.to_string()));
        params
    }
}
