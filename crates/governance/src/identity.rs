//! Caller identity hashing.
//!
//! Raw client addresses never reach the limiter; buckets are keyed by a
//! salted HMAC of the address, truncated to keep keys short.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the hex identity key.
pub const IDENTITY_HASH_LEN: usize = 24;

/// Hash a client address into an opaque limiter key.
pub fn hash_identity(salt: &str, address: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC accepts any key length");
    mac.update(address.as_bytes());
    let mut digest = hex::encode(mac.finalize().into_bytes());
    digest.truncate(IDENTITY_HASH_LEN);
    digest
}
