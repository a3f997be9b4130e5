//! Canonicalization functionality for signature generation and validation.
//!
//! The signing string is the request line followed by one line per signed header:
//!
//! ```text
//! (request-target): post /v1/orders?limit=10
//! date: 2024-01-02T03:04:05.678Z
//! digest: SHA-256=k6I5cakU5erL8KjSUVTNownDwccvu5kU1Hxg88toFYg=
//! ```
//!
//! The path and query are used verbatim, without any re-encoding, and there is no trailing
//! newline. Both the signer and the verifier build the string through [`signing_string`] so they
//! cannot drift apart.

use {
    crate::{constants::REQUEST_TARGET, SignatureError},
    http::{
        header::{HeaderMap, HeaderValue},
        method::Method,
        uri::{PathAndQuery, Uri},
    },
    log::trace,
    qualifier_attr::qualifiers,
    std::str::FromStr,
};

/// Parse a URL string into a [`Uri`], reporting failures as [`SignatureError::MalformedUrl`].
pub fn parse_url(url: &str) -> Result<Uri, SignatureError> {
    let uri = Uri::from_str(url).map_err(|e| SignatureError::MalformedUrl(format!("Invalid URL '{}': {}", url, e)))?;
    request_target(&uri)?;
    Ok(uri)
}

/// Return the request target (`path[?query]`) of a URI.
///
/// The query is omitted when absent or empty. A URI without a path, or with a path that does not
/// start with `/` (e.g. a host-only `https://api.example.com`, an authority-form `host:443` or the
/// asterisk-form `*`), is rejected with [`SignatureError::MalformedUrl`].
pub fn request_target(uri: &Uri) -> Result<String, SignatureError> {
    if !has_path(uri) {
        return Err(SignatureError::MalformedUrl(format!("URL has no usable path: '{}'", uri)));
    }

    let path = uri.path();

    match uri.query() {
        Some(query) if !query.is_empty() => Ok(format!("{}?{}", path, query)),
        _ => Ok(path.to_string()),
    }
}

/// Whether the URI carries an explicit path starting with `/`.
///
/// `Uri` reports an absent path as `/` for absolute URIs; only comparing the raw path-and-query
/// against a literal `/` tells the two apart.
fn has_path(uri: &Uri) -> bool {
    let Some(path_and_query) = uri.path_and_query() else {
        return false;
    };

    match path_and_query.as_str() {
        "/" => *path_and_query == PathAndQuery::from_static("/"),
        s => s.starts_with('/'),
    }
}

/// Build the string to sign from the request line and the required headers, in the order given.
///
/// Header lookup is case-insensitive; header names are lowercased in the output. If a required
/// header has several values, the first one is used. A missing header fails with
/// [`SignatureError::MissingHeader`] naming the header as it was requested; a partial signing
/// string is never produced.
pub fn signing_string<N>(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    required_header_names: &[N],
) -> Result<String, SignatureError>
where
    N: AsRef<str>,
{
    let target = request_target(uri)?;
    let method = method.as_str().to_lowercase();

    let mut result = String::with_capacity(256);
    result.push_str(REQUEST_TARGET);
    result.push_str(": ");
    result.push_str(&method);
    result.push(' ');
    result.push_str(&target);

    for name in required_header_names {
        let name = name.as_ref();
        let value = header_value(headers, name)?;
        result.push('\n');
        result.push_str(&name.to_lowercase());
        result.push_str(": ");
        result.push_str(value);
    }

    trace!("Signing string:\n{}", result);
    Ok(result)
}

/// Look up a header value as text.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, SignatureError> {
    // HeaderMap lookups by &str are case-insensitive. Names that are not valid header names cannot
    // be present at all and come back as None.
    let value: Option<&HeaderValue> = headers.get(name);
    let Some(value) = value else {
        return Err(SignatureError::MissingHeader(name.to_string()));
    };

    value.to_str().map_err(|_| {
        SignatureError::MalformedHeader(format!("Header '{}' must contain only visible ASCII characters", name))
    })
}
