//! Scripted transport for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{Request, Response, Transport};
use crate::error::TransportError;

/// Transport that answers from a route table keyed by request cache key.
///
/// Unrouted requests fail as unreachable, and `set_down(true)` makes every
/// request fail regardless of routes.
#[derive(Default)]
pub struct FakeTransport {
  routes: Mutex<HashMap<String, Response>>,
  down: AtomicBool,
  log: Mutex<Vec<Request>>,
}

impl FakeTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, key: &str, response: Response) {
    self.routes.lock().unwrap().insert(key.to_string(), response);
  }

  pub fn respond_json(&self, key: &str, value: &serde_json::Value) {
    self.respond(key, Response::new(200, key, value.to_string()));
  }

  pub fn set_down(&self, down: bool) {
    self.down.store(down, Ordering::SeqCst);
  }

  pub fn requests(&self) -> Vec<Request> {
    self.log.lock().unwrap().clone()
  }

  pub fn request_count(&self) -> usize {
    self.log.lock().unwrap().len()
  }
}

#[async_trait]
impl Transport for FakeTransport {
  async fn send(&self, request: Request) -> Result<Response, TransportError> {
    let key = request.cache_key();
    self.log.lock().unwrap().push(request);

    if self.down.load(Ordering::SeqCst) {
      return Err(TransportError::Unreachable("simulated outage".to_string()));
    }

    self
      .routes
      .lock()
      .unwrap()
      .get(&key)
      .cloned()
      .ok_or_else(|| TransportError::Unreachable(format!("no route for {}", key)))
  }
}
