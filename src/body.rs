//! HTTP request body handling utilities.
use bytes::Bytes;

/// A trait for exposing the bytes of a request body that will be transmitted.
///
/// The digest is computed over exactly these bytes, so text must already be encoded the way it
/// will go out on the wire. Returning `None` means the request has no body at all, which is
/// different from an empty body: an empty body still gets a `Digest` header.
pub trait SignableBody {
    /// Return the body bytes, or `None` if there is no body.
    fn signable_bytes(&self) -> Option<&[u8]>;
}

/// The unit type `()` represents a request without a body.
impl SignableBody for () {
    fn signable_bytes(&self) -> Option<&[u8]> {
        None
    }
}

impl SignableBody for Bytes {
    fn signable_bytes(&self) -> Option<&[u8]> {
        Some(self.as_ref())
    }
}

impl SignableBody for Vec<u8> {
    fn signable_bytes(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

impl SignableBody for String {
    fn signable_bytes(&self) -> Option<&[u8]> {
        Some(self.as_bytes())
    }
}

impl SignableBody for &[u8] {
    fn signable_bytes(&self) -> Option<&[u8]> {
        Some(*self)
    }
}

impl SignableBody for &str {
    fn signable_bytes(&self) -> Option<&[u8]> {
        Some(self.as_bytes())
    }
}

/// `None` is a request without a body; `Some(body)` defers to the inner body.
impl<B: SignableBody> SignableBody for Option<B> {
    fn signable_bytes(&self) -> Option<&[u8]> {
        self.as_ref().and_then(SignableBody::signable_bytes)
    }
}
