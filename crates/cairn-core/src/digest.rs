//! Content digests for records.
//!
//! A record id is the SHA-256 over its identifying fields, truncated to
//! [`ID_LEN`] hex characters. Identical record text yields the same id no
//! matter where in the log it sits.

use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
pub const ID_LEN: usize = 12;

/// Compute a stable id over `parts`.
///
/// Parts are separated by a unit separator so `["ab", "c"]` and `["a", "bc"]`
/// hash differently.
pub fn record_id<S: AsRef<str>>(parts: &[S]) -> String {
  let mut hasher = Sha256::new();
  for part in parts {
    hasher.update(part.as_ref().trim().as_bytes());
    hasher.update([0x1f]);
  }
  let mut id = hex::encode(hasher.finalize());
  id.truncate(ID_LEN);
  id
}
