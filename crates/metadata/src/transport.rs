//! Blocking HTTP transport used for the primary lookup and for downloads.

use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::TransportError;

/// Issues a single GET and returns the response body.
pub trait Transport {
    fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<Bytes, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<Bytes, TransportError> {
        (**self).get(url, params, timeout)
    }
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<Bytes, TransportError> {
        debug!(url = %url, ?timeout, "HTTP GET");

        let mut request = self.client.get(url).timeout(timeout);
        if !params.is_empty() {
            request = request.query(params);
        }

        let resp = request.send().map_err(map_reqwest_error)?;

        if !resp.status().is_success() {
            return Err(TransportError::Status(resp.status().as_u16()));
        }

        resp.bytes().map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_body() || e.is_decode() {
        TransportError::Body(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let err = HttpTransport::new()
            .get("http://127.0.0.1:9/", &[], Duration::from_secs(2))
            .unwrap_err();
        assert!(
            matches!(
                err,
                TransportError::Connect(_) | TransportError::Request(_) | TransportError::Timeout(_)
            ),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn invalid_url_is_a_request_error() {
        let err = HttpTransport::new()
            .get("not a url", &[], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, TransportError::Request(_) | TransportError::Connect(_)));
    }
}
