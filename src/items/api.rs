//! Request builders for the remote item endpoint.

use url::Url;

use super::Item;
use crate::error::TransportError;
use crate::net::{Request, Response};

/// Describes the remote collection endpoint: `GET <base>?_limit=N` to read,
/// `POST <base>` to create.
#[derive(Debug, Clone)]
pub struct ItemsApi {
  base: Url,
  limit: usize,
}

impl ItemsApi {
  pub fn new(base: Url, limit: usize) -> Self {
    Self { base, limit }
  }

  /// Bounded read of the collection.
  pub fn list_request(&self) -> Request {
    let mut url = self.base.clone();
    url
      .query_pairs_mut()
      .append_pair("_limit", &self.limit.to_string());
    Request::get(url)
  }

  pub fn create_request(&self, item: &Item) -> Result<Request, TransportError> {
    Request::post_json(self.base.clone(), item).map_err(|e| TransportError::Decode(e.to_string()))
  }

  /// Parse a successful list response. Non-2xx statuses are errors.
  pub fn parse_list(response: &Response) -> Result<Vec<Item>, TransportError> {
    if !response.is_success() {
      return Err(TransportError::Status(response.status));
    }
    response.json()
  }
}
