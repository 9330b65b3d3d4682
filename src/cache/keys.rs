use sha2::{Digest, Sha256};

/// Hash a request key into a stable, fixed-length storage key.
pub fn hash_key(request_key: &str) -> String {
  // SHA256 hash for stable, fixed-length keys
  let mut hasher = Sha256::new();
  hasher.update(request_key.as_bytes());
  hex::encode(hasher.finalize())
}
