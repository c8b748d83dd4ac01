//! HMAC-SHA1 request signing
//!
//! The PTV API authenticates a request by a signature over its path and query
//! string (scheme and host excluded). The query must already contain `devid`;
//! the `signature` parameter itself is never part of the signed input.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Sign a request path-plus-query and return the lowercase hex MAC
#[must_use]
pub fn sign(path_and_query: &str, secret_key: &[u8]) -> String {
    // HMAC accepts keys of any length, so this never fails
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha1::new_from_slice(secret_key).expect("HMAC can take key of any size");
    mac.update(path_and_query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
