//! The HTTP boundary of the fetch pipeline.
//!
//! The core depends on one shape only: given a URL, return the response
//! bytes or a classified failure. Timeouts and connection pooling stay
//! inside the transport implementation.

use crate::archive::error::FetchError;
use log::warn;
use reqwest::{Client, StatusCode};
use std::future::Future;

/// A client able to retrieve one URL's bytes.
///
/// Implementations must classify outcomes: a missing resource is
/// [`FetchError::NotFound`], a non-success status is
/// [`FetchError::HttpStatus`], and a failed request is
/// [`FetchError::Transport`]. The fetcher's retry policy keys off that
/// distinction.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: Client::new(),
        }
    }

    /// Reuse an already-configured client (custom timeouts, proxies).
    pub fn with_client(client: Client) -> Self {
        HttpTransport { client }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        let request = self.client.get(url);
        let url = url.to_string();
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::Transport(url.clone(), e))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound(url));
            }
            if !status.is_success() {
                warn!("HTTP {} for {}", status, url);
                return Err(FetchError::HttpStatus { url, status });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(url, e))?;
            Ok(body.to_vec())
        }
    }
}
