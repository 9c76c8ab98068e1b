//! `data:` URL encoding for inline file contents.

use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// Bytes left unescaped besides ASCII alphanumerics.
const DATA_URL_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataUrlError {
    #[error("missing \"data:\" prefix")]
    NotDataUrl,
    #[error("missing \",\" separator")]
    MissingComma,
    #[error("invalid base64 payload: {0}")]
    Base64(String),
}

/// Percent-escape `contents` into a `data:,` URL.
pub fn encode(contents: &str) -> String {
    format!("data:,{}", utf8_percent_encode(contents, DATA_URL_ESCAPE))
}

/// Decode a `data:` URL into its payload bytes.
///
/// Accepts an optional media type and a `;base64` marker; anything else is
/// treated as a percent-escaped payload.
pub fn decode(url: &str) -> Result<Vec<u8>, DataUrlError> {
    let rest = url
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &url[5..])
        .ok_or(DataUrlError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingComma)?;

    let unescaped: Vec<u8> = percent_decode_str(payload).collect();
    let is_base64 = header
        .rsplit(';')
        .next()
        .is_some_and(|param| param.trim().eq_ignore_ascii_case("base64"));
    if is_base64 {
        let compact: Vec<u8> = unescaped
            .into_iter()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        return base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| DataUrlError::Base64(e.to_string()));
    }
    Ok(unescaped)
}
