use {
    crate::constants::DIGEST_SHA256_PREFIX,
    base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine},
    sha2::{Digest, Sha256},
};

/// The length of a SHA-256 digest in bytes.
pub(crate) const SHA256_OUTPUT_LEN: usize = 32;

#[inline(always)]
pub(crate) fn sha256(value: &[u8]) -> [u8; SHA256_OUTPUT_LEN] {
    Sha256::digest(value).into()
}

/// Compute the value of the `Digest` header for a request body.
///
/// The digest covers exactly the bytes that will be transmitted and is rendered as
/// `SHA-256=<base64>`, using the standard padded base64 alphabet.
pub fn body_digest(body: &[u8]) -> String {
    let mut result = String::with_capacity(DIGEST_SHA256_PREFIX.len() + 44);
    result.push_str(DIGEST_SHA256_PREFIX);
    BASE64_STANDARD.encode_string(sha256(body), &mut result);
    result
}
