use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;
use xxhash_rust::xxh3::xxh3_128;

/// Length of the hex digest produced by [`xxhash_hex`].
pub const CHECKSUM_LEN: usize = 32;

static CHECKSUM_SUFFIX_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(.+)-[0-9a-f]{32}((?:\.[^./]+)*)$").unwrap());

/// 128 bit xxh3 digest, rendered as 32 lowercase hex chars.
pub fn xxhash_hex(input: &[u8]) -> String {
  format!("{:032x}", xxh3_128(input))
}

/// `index-<checksum>.js` -> `index.js`. Names without a checksum are returned untouched.
pub fn strip_checksum_suffix(file_name: &str) -> Cow<'_, str> {
  CHECKSUM_SUFFIX_RE.replace(file_name, "$1$2")
}

#[test]
fn test_xxhash_hex() {
  let hash = xxhash_hex(b"hello");
  assert_eq!(hash.len(), CHECKSUM_LEN);
  assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
  assert_eq!(hash, xxhash_hex(b"hello"));
  assert_ne!(hash, xxhash_hex(b"hello!"));
  assert_eq!(xxhash_hex(b"").len(), CHECKSUM_LEN);
}

#[test]
fn test_strip_checksum_suffix() {
  let checksum = xxhash_hex(b"module.exports = 1");
  assert_eq!(strip_checksum_suffix(&format!("index-{checksum}.js")), "index.js");
  assert_eq!(strip_checksum_suffix(&format!("index-{checksum}.js.map")), "index.js.map");
  assert_eq!(strip_checksum_suffix(&format!("a-b-{checksum}")), "a-b");
  assert_eq!(strip_checksum_suffix("index.js"), "index.js");
  assert_eq!(strip_checksum_suffix("index-1234.js"), "index-1234.js");
}
