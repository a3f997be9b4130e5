//! Common constants used throughout the crate.
//!
//! This was consolidated here so the entire crate is on the same page about these constant
//! values. If a value is spelled incorrectly, at least it can be fixed in one spot.
//!
//! Tests that are testing the content of a header, error code or message should not use these
//! constants; they should use hard-coded strings so the tests are also testing for misspellings.
//!
//! Please keep this file organized alphabetically. (This can be a bit hard with comments, etc.)

/// Default allowed timestamp mismatch in minutes when verifying a request.
pub(crate) const ALLOWED_MISMATCH_MINUTES: i64 = 15;

/// Content-Type for JSON request bodies.
pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Value of the `Accept` header set alongside a signature.
pub(crate) const APPLICATION_JSON_ACCEPT: &str = "application/json, text/plain, */*";

/// Prefix of the `Authorization` header value.
pub(crate) const AUTHORIZATION_SCHEME: &str = "Signature ";

/// Host suffix of the default API endpoint.
pub(crate) const DEFAULT_BASE_ENDPOINT: &str = "api.dexible.io/v1";

/// Prefix of the `Digest` header value.
pub(crate) const DIGEST_SHA256_PREFIX: &str = "SHA-256=";

/// Environment variable overriding the API base URL.
pub(crate) const ENV_API_BASE_URL: &str = "API_BASE_URL";

/// Error code: IncompleteSignature
pub(crate) const ERR_CODE_INCOMPLETE_SIGNATURE: &str = "IncompleteSignature";

/// Error code: MalformedHeader
pub(crate) const ERR_CODE_MALFORMED_HEADER: &str = "MalformedHeader";

/// Error code: MalformedUrl
pub(crate) const ERR_CODE_MALFORMED_URL: &str = "MalformedUrl";

/// Error code: MissingAuthenticationToken
pub(crate) const ERR_CODE_MISSING_AUTHENTICATION_TOKEN: &str = "MissingAuthenticationToken";

/// Error code: MissingHeader
pub(crate) const ERR_CODE_MISSING_HEADER: &str = "MissingHeader";

/// Error code: SignatureDoesNotMatch
pub(crate) const ERR_CODE_SIGNATURE_DOES_NOT_MATCH: &str = "SignatureDoesNotMatch";

/// Error code: SignatureExpired
pub(crate) const ERR_CODE_SIGNATURE_EXPIRED: &str = "SignatureExpired";

/// Error code: SigningUnavailable
pub(crate) const ERR_CODE_SIGNING_UNAVAILABLE: &str = "SigningUnavailable";

/// Error code: UnsupportedChain
pub(crate) const ERR_CODE_UNSUPPORTED_CHAIN: &str = "UnsupportedChain";

/// Personal-message banner prepended (together with the message length) before signing.
pub(crate) const ETHEREUM_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Only network the API is deployed on.
pub(crate) const ETHEREUM_NETWORK: &str = "ethereum";

/// Header field for the request timestamp.
pub(crate) const HDR_DATE: &str = "date";

/// Header field for the body digest.
pub(crate) const HDR_DIGEST: &str = "digest";

/// Timestamp format for the `Date` header: ISO 8601 with milliseconds and a literal `Z`.
pub(crate) const ISO8601_MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Algorithm name carried in the signature parameters.
pub(crate) const KECCAK_256: &str = "keccak-256";

/// Error message: `"Authorization header must use the 'Signature' scheme."`
pub(crate) const MSG_AUTH_HEADER_REQ_SIGNATURE_SCHEME: &str = "Authorization header must use the 'Signature' scheme.";

/// Error message: `"Body digest does not match the Digest header."`
pub(crate) const MSG_DIGEST_MISMATCH: &str = "Body digest does not match the Digest header.";

/// Error message: `"Request is missing Authentication Token"`
pub(crate) const MSG_REQUEST_MISSING_AUTH_TOKEN: &str = "Request is missing Authentication Token";

/// Error message: `"The request signature we calculated does not match the signature you provided."`
pub(crate) const MSG_REQUEST_SIGNATURE_MISMATCH: &str =
    "The request signature we calculated does not match the signature you provided.";

/// Error message: `"Unsupported signature 'algorithm': "`
pub(crate) const MSG_UNSUPPORTED_ALGORITHM: &str = "Unsupported signature 'algorithm': ";

/// Signature parameter carrying the algorithm name.
pub(crate) const PARAM_ALGORITHM: &str = "algorithm";

/// Signature parameter carrying the signed header names.
pub(crate) const PARAM_HEADERS: &str = "headers";

/// Signature parameter carrying the signer address.
pub(crate) const PARAM_KEY_ID: &str = "keyId";

/// Signature parameter carrying the signature itself.
pub(crate) const PARAM_SIGNATURE: &str = "signature";

/// Pseudo-header naming the request line in the signing string.
pub(crate) const REQUEST_TARGET: &str = "(request-target)";

/// Length of a raw recoverable signature: `r || s || v`.
pub(crate) const SIGNATURE_LENGTH: usize = 65;

/// Timestamp used by the unit tests.
#[cfg(test)]
pub(crate) const TEST_DATE: &str = "2024-01-02T03:04:05.678Z";

/// Well-known development private key used by the unit tests. Never fund this address.
#[cfg(test)]
pub(crate) const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Checksummed address of [`TEST_PRIVATE_KEY`].
#[cfg(test)]
pub(crate) const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
