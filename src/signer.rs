//! The holder's signing capability.
//!
//! Key material never passes through this crate. A [`PersonalMessageSigner`] knows its own address
//! and can produce a recoverable signature over a personal message; that is all the protocol needs.

use {
    crate::SignatureError,
    alloy_primitives::{Address, Signature},
    alloy_signer::SignerSync,
    alloy_signer_local::PrivateKeySigner,
    log::trace,
    std::{
        fmt::{Debug, Formatter, Result as FmtResult},
        sync::{Arc, Mutex},
    },
    tower::BoxError,
};

/// A capability that holds a private key, signs arbitrary personal messages with it, and exposes
/// the address the signatures recover to.
///
/// Implementations must apply the standard personal-message envelope
/// (`"\x19Ethereum Signed Message:\n" || len(message) || message`) before hashing with
/// Keccak-256 and signing, as `eth_sign`/`personal_sign` do.
///
/// The trait requires `Send + Sync`. Capabilities that cannot tolerate concurrent invocation should
/// be wrapped in a [`SerializedSigner`].
pub trait PersonalMessageSigner: Send + Sync {
    /// The address that signatures produced by this signer recover to.
    fn address(&self) -> Address;

    /// Sign `message` under the personal-message convention.
    fn sign_personal_message(&self, message: &[u8]) -> Result<Signature, BoxError>;
}

impl PersonalMessageSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    fn sign_personal_message(&self, message: &[u8]) -> Result<Signature, BoxError> {
        self.sign_message_sync(message).map_err(|e| SignatureError::from(e).into())
    }
}

impl<S: PersonalMessageSigner + ?Sized> PersonalMessageSigner for &S {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn sign_personal_message(&self, message: &[u8]) -> Result<Signature, BoxError> {
        (**self).sign_personal_message(message)
    }
}

impl<S: PersonalMessageSigner + ?Sized> PersonalMessageSigner for Box<S> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn sign_personal_message(&self, message: &[u8]) -> Result<Signature, BoxError> {
        (**self).sign_personal_message(message)
    }
}

impl<S: PersonalMessageSigner + ?Sized> PersonalMessageSigner for Arc<S> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn sign_personal_message(&self, message: &[u8]) -> Result<Signature, BoxError> {
        (**self).sign_personal_message(message)
    }
}

/// Serializes access to a signing capability that cannot be invoked concurrently.
///
/// The lock is scoped to this one capability; signing calls on other signers are unaffected. A
/// poisoned lock is reported as [`SignatureError::SigningUnavailable`].
pub struct SerializedSigner<S> {
    address: Address,
    inner: Mutex<S>,
}

impl<S: PersonalMessageSigner> SerializedSigner<S> {
    /// Wrap `inner`, caching its address.
    pub fn new(inner: S) -> Self {
        Self {
            address: inner.address(),
            inner: Mutex::new(inner),
        }
    }

    /// Unwrap the signer.
    pub fn into_inner(self) -> Result<S, SignatureError> {
        self.inner.into_inner().map_err(|e| SignatureError::SigningUnavailable(e.to_string().into()))
    }
}

impl<S> Debug for SerializedSigner<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SerializedSigner").field("address", &format_args!("{}", self.address)).finish_non_exhaustive()
    }
}

impl<S: PersonalMessageSigner> PersonalMessageSigner for SerializedSigner<S> {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_personal_message(&self, message: &[u8]) -> Result<Signature, BoxError> {
        let guard = self.inner.lock().map_err(|e| SignatureError::SigningUnavailable(e.to_string().into()))?;
        guard.sign_personal_message(message)
    }
}

/// A signature from which the signer's address can be recovered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RecoverableSignature {
    signature: Signature,
}

impl RecoverableSignature {
    /// Retrieve the underlying signature.
    #[inline(always)]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The signature as `0x`-prefixed hex of `r || s || v`, with `v` in `{27, 28}`.
    pub fn signature_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signature.as_bytes()))
    }

    /// The recovery id (y-parity) of the signature: `0` or `1`.
    #[inline(always)]
    pub fn recovery_id(&self) -> u8 {
        self.signature.v() as u8
    }

    /// Recover the address that signed `message` under the personal-message convention.
    pub fn recover_address(&self, message: &[u8]) -> Result<Address, SignatureError> {
        self.signature
            .recover_address_from_msg(message)
            .map_err(|e| SignatureError::SignatureDoesNotMatch(Some(format!("Unable to recover signer: {}", e))))
    }
}

impl From<Signature> for RecoverableSignature {
    fn from(signature: Signature) -> Self {
        Self {
            signature,
        }
    }
}

/// Sign the wrapped signing string with the holder's capability.
///
/// No retries happen here; a failure of the capability is reported as
/// [`SignatureError::SigningUnavailable`].
pub fn sign_wrapped<S>(signer: &S, wrapped: &[u8]) -> Result<RecoverableSignature, SignatureError>
where
    S: PersonalMessageSigner + ?Sized,
{
    let signature = signer.sign_personal_message(wrapped).map_err(SignatureError::from)?;
    trace!("Produced signature with recovery id {}", signature.v() as u8);
    Ok(signature.into())
}
