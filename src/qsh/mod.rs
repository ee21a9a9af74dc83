//! Query string hash (qsh) canonicalization
//!
//! Computes the canonical digest of an HTTP request's method, path, and query
//! parameters used by the Connect `qsh` claim. The digest binds a token to one
//! specific request shape, so a token minted for one URL cannot be replayed
//! against another.
//!
//! The canonical form must match the issuing side bit-for-bit:
//!
//! ```text
//! {METHOD}&{uri}&{sorted_query_string}
//! ```
//!
//! # Example
//!
//! ```
//! use connect_authr::qsh::compute_query_hash;
//!
//! let hash = compute_query_hash("/rest/api/2/issue", "get", [("fields", "summary")]);
//! assert_eq!(hash.len(), 64);
//! ```

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// RFC 3986 unreserved characters stay literal, everything else is %XX-escaped.
const QSH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Query parameter carrying the token itself, never covered by the hash.
const TOKEN_PARAM: &str = "jwt";

/// Compute the query string hash for a request.
///
/// `params` is the ordered query pair sequence as received; repeated keys form
/// a multi-valued entry whose encoded values are joined with `,`. Input order
/// never affects the result: entries are sorted by key, byte-wise ascending.
///
/// Returns the lowercase hex SHA-256 digest of the canonical string.
pub fn compute_query_hash<'a, I>(uri: &str, method: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    // BTreeMap gives the ordinal key sort; values keep arrival order.
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in params {
        if key == TOKEN_PARAM {
            continue;
        }
        grouped.entry(key).or_default().push(value);
    }

    let query = grouped
        .iter()
        .map(|(key, values)| {
            let encoded_key = utf8_percent_encode(key, QSH_ENCODE_SET).to_string();
            let encoded_values = values
                .iter()
                .map(|v| utf8_percent_encode(v, QSH_ENCODE_SET).to_string())
                .collect::<Vec<_>>()
                .join(",");
            format!("{}={}", encoded_key, encoded_values)
        })
        .collect::<Vec<_>>()
        .join("&");

    let canonical = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        uri.trim_end_matches('/'),
        query
    );

    hex::encode(Sha256::digest(canonical.as_bytes()))
}
