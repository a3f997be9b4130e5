use {
    crate::constants::*,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    },
    tower::BoxError,
};

/// Error returned when an attempt at signing or verifying a request fails.
///
/// Every variant is raised before any network I/O takes place; a request that fails to sign is
/// never handed to the transport.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// The `Authorization` header parameters are incomplete or use an unsupported algorithm. Sample
    /// messages:
    /// `Authorization header requires 'keyId' parameter.`
    /// `Unsupported signature 'algorithm': 'rsa-sha256'`
    IncompleteSignature(/* message */ String),

    /// A header value could not be used: it is not visible ASCII, or it could not be parsed (e.g.
    /// the `Date` header is not a valid timestamp).
    MalformedHeader(/* message */ String),

    /// The URL lacks a usable path, or could not be parsed at all.
    MalformedUrl(/* message */ String),

    /// The request being verified carries no `Authorization` header.
    MissingAuthenticationToken(/* message */ String),

    /// A header listed as required for the signature is not present on the request. This is an
    /// orchestration bug; retrying will not help.
    MissingHeader(/* header name */ String),

    /// The signature did not match the request contents or the claimed `keyId`.
    SignatureDoesNotMatch(Option</* message */ String>),

    /// The signed `Date` falls outside of the allowed window around the verifier's clock.
    SignatureExpired(/* message */ String),

    /// The signing capability could not produce a signature. This may be transient; whether to
    /// retry is up to the caller.
    SigningUnavailable(BoxError),

    /// The network or chain id has no known API deployment.
    UnsupportedChain(/* message */ String),
}

impl SignatureError {
    /// A stable, machine-readable code for the error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::IncompleteSignature(_) => ERR_CODE_INCOMPLETE_SIGNATURE,
            Self::MalformedHeader(_) => ERR_CODE_MALFORMED_HEADER,
            Self::MalformedUrl(_) => ERR_CODE_MALFORMED_URL,
            Self::MissingAuthenticationToken(_) => ERR_CODE_MISSING_AUTHENTICATION_TOKEN,
            Self::MissingHeader(_) => ERR_CODE_MISSING_HEADER,
            Self::SignatureDoesNotMatch(_) => ERR_CODE_SIGNATURE_DOES_NOT_MATCH,
            Self::SignatureExpired(_) => ERR_CODE_SIGNATURE_EXPIRED,
            Self::SigningUnavailable(_) => ERR_CODE_SIGNING_UNAVAILABLE,
            Self::UnsupportedChain(_) => ERR_CODE_UNSUPPORTED_CHAIN,
        }
    }

    /// Indicates whether retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SigningUnavailable(_))
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::IncompleteSignature(msg) => f.write_str(msg),
            Self::MalformedHeader(msg) => f.write_str(msg),
            Self::MalformedUrl(msg) => f.write_str(msg),
            Self::MissingAuthenticationToken(msg) => f.write_str(msg),
            Self::MissingHeader(name) => write!(f, "Header expected to exist and have value set: {}", name),
            Self::SignatureDoesNotMatch(msg) => {
                if let Some(msg) = msg {
                    f.write_str(msg)
                } else {
                    Ok(())
                }
            }
            Self::SignatureExpired(msg) => f.write_str(msg),
            Self::SigningUnavailable(ref e) => write!(f, "Signing capability unavailable: {}", e),
            Self::UnsupportedChain(msg) => f.write_str(msg),
        }
    }
}

impl Error for SignatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SigningUnavailable(ref e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<alloy_signer::Error> for SignatureError {
    fn from(e: alloy_signer::Error) -> SignatureError {
        SignatureError::SigningUnavailable(Box::new(e))
    }
}

impl From<BoxError> for SignatureError {
    fn from(e: BoxError) -> SignatureError {
        match e.downcast::<SignatureError>() {
            Ok(sig_err) => *sig_err,
            Err(e) => SignatureError::SigningUnavailable(e),
        }
    }
}
