//! Response header flattening
//!
//! HTTP allows a header name to appear more than once. The record keeps a
//! single string per name, joining occurrences with `", "` in the order the
//! server sent them (RFC 9110 §5.3).

use std::collections::BTreeMap;

use http::HeaderMap;

/// Separator used to join repeated header values
pub const HEADER_VALUE_SEPARATOR: &str = ", ";

/// Flatten a header map into one string value per canonical header name
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flattened = BTreeMap::new();

    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .collect::<Vec<_>>()
            .join(HEADER_VALUE_SEPARATOR);

        flattened.insert(canonical_header_name(name.as_str()), joined);
    }

    flattened
}

/// Canonical MIME form of a header name: the first letter and every letter
/// following a hyphen upper-cased, the rest lower-cased.
///
/// Names containing bytes outside the token set are returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
