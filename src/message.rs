//! Personal-message wrapping of the signing string.
//!
//! The signing string is wrapped in the personal-message envelope and the result is handed to a
//! personal-message signer, which wraps it again. Verifiers expect a signature over
//!
//! ```text
//! keccak256(PREFIX || len(PREFIX || len(M) || M) || PREFIX || len(M) || M)
//! ```
//!
//! where `PREFIX` is `"\x19Ethereum Signed Message:\n"` and lengths are decimal text. This module
//! applies the inner envelope exactly once; the outer one is applied by
//! [`PersonalMessageSigner::sign_personal_message`][crate::PersonalMessageSigner::sign_personal_message].
//! Applying it twice here, or not at all, produces signatures nobody can verify.

use crate::constants::ETHEREUM_SIGNED_MESSAGE_PREFIX;

/// Wrap a signing string in the personal-message envelope: `PREFIX || len(M) || M`.
pub fn wrap_personal_message(signing_string: &str) -> Vec<u8> {
    let message = signing_string.as_bytes();
    let length = message.len().to_string();

    let mut result = Vec::with_capacity(ETHEREUM_SIGNED_MESSAGE_PREFIX.len() + length.len() + message.len());
    result.extend_from_slice(ETHEREUM_SIGNED_MESSAGE_PREFIX);
    result.extend_from_slice(length.as_bytes());
    result.extend_from_slice(message);
    result
}
