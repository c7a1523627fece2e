//! Canonical form of an outgoing request for AWS Signature Version 4.
//!
//! Every header on the request is signed. `HeaderMap` names are already
//! lowercase, so only the values need normalising.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::HeaderMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::AuthError;

/// RFC 3986 unreserved characters stay as they are.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The canonical request text and the signed header list that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// Newline-joined canonical request, hashed into the string to sign.
    pub text: String,
    /// `;`-joined sorted header names, repeated in `Authorization`.
    pub signed_headers: String,
}

/// Canonicalize `request` whose body hashes to `payload_hash`.
pub fn canonical_request(
    request: &http::Request<Bytes>,
    payload_hash: &str,
) -> Result<CanonicalRequest, AuthError> {
    let uri = request.uri();
    let (headers, signed_headers) = canonical_headers(request.headers())?;
    let text = format!(
        "{method}\n{path}\n{query}\n{headers}\n{signed_headers}\n{payload_hash}",
        method = request.method(),
        path = canonical_uri(uri.path()),
        query = canonical_query(uri.query().unwrap_or("")),
    );
    Ok(CanonicalRequest {
        text,
        signed_headers,
    })
}

/// Encode each segment of the request-line path once more, as every service
/// other than S3 expects. An empty path is `/`.
#[must_use]
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, UNRESERVED).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Query parameters sorted by name then value. A bare name gets an empty value.
#[must_use]
pub fn canonical_query(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|param| !param.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();
    params.sort_unstable();
    params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// The canonical header block (one `name:value\n` line per name) and the
/// signed header list.
///
/// Values are trimmed with inner whitespace runs collapsed; repeated headers
/// are joined with commas in the order they were added.
pub fn canonical_headers(headers: &HeaderMap) -> Result<(String, String), AuthError> {
    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidHeaderValue(name.as_str().to_owned()))?;
        grouped
            .entry(name.as_str())
            .or_default()
            .push(value.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    let block = grouped
        .iter()
        .map(|(name, values)| format!("{name}:{}\n", values.join(",")))
        .collect();
    let signed = grouped.keys().copied().collect::<Vec<_>>().join(";");
    Ok((block, signed))
}
