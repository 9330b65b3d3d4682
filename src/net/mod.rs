//! Network boundary: the request/response model and the transport seam.
//!
//! Everything that talks to the network goes through [`Transport`], so the
//! intercept proxy can sit transparently in front of the real HTTP client.

mod http;
#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::TransportError;

pub use http::HttpTransport;

/// An outbound request.
#[derive(Debug, Clone)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub headers: Vec<(String, String)>,
  pub body: Option<Vec<u8>>,
}

impl Request {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      headers: Vec::new(),
      body: None,
    }
  }

  /// Build a POST carrying `value` as a JSON body.
  pub fn post_json<T: Serialize>(url: Url, value: &T) -> Result<Self, serde_json::Error> {
    Ok(Self {
      method: Method::POST,
      url,
      headers: vec![("Content-Type".to_string(), "application/json".to_string())],
      body: Some(serde_json::to_vec(value)?),
    })
  }

  /// Key under which a response to this request is cached.
  ///
  /// GET requests are keyed by URL alone, everything else by method + URL.
  pub fn cache_key(&self) -> String {
    if self.method == Method::GET {
      self.url.to_string()
    } else {
      format!("{} {}", self.method, self.url)
    }
  }
}

/// A response as observed at the network boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  /// Final URL the response was served from (after redirects).
  pub url: String,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      url: url.into(),
      headers: Vec::new(),
      body: body.into(),
    }
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Turn a non-2xx response into a [`TransportError::Status`].
  pub fn error_for_status(self) -> Result<Self, TransportError> {
    if self.is_success() {
      Ok(self)
    } else {
      Err(TransportError::Status(self.status))
    }
  }

  pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
    serde_json::from_slice(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
  }
}

/// Something that can carry a request to the network and back.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: Request) -> Result<Response, TransportError>;
}
