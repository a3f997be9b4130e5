//! Request verification: the receiving side of the protocol.
//!
//! Verification reproduces exactly what the signer did. The signing string is rebuilt over the
//! headers named in the signature, wrapped once by hand, and the signer address is recovered from
//! the signature under the personal-message convention. The request is authentic if that address
//! is the `keyId` the request claims.

use {
    crate::{
        body::SignableBody,
        canonical::signing_string,
        chronoutil::parse_request_timestamp,
        constants::*,
        crypto::body_digest,
        message::wrap_personal_message,
        signature::SignatureDescriptor,
        signer::RecoverableSignature,
        SignatureError,
    },
    alloy_primitives::{Address, Signature},
    chrono::{DateTime, Duration, Utc},
    http::{
        header::{HeaderMap, AUTHORIZATION},
        method::Method,
        request::{Parts, Request},
        uri::Uri,
    },
    log::trace,
    std::str::FromStr,
    subtle::ConstantTimeEq,
};

/// The default window around the verifier's clock within which a request's `Date` is accepted.
pub fn default_allowed_mismatch() -> Duration {
    Duration::minutes(ALLOWED_MISMATCH_MINUTES)
}

/// Verify a signed request and return the address that signed it.
///
/// # Parameters
/// * `request` - The HTTP [`Request`] to verify.
/// * `server_timestamp` - The timestamp of the server when the request was received. Usually this
///   is the current time, `Utc::now()`.
/// * `allowed_mismatch` - How far the request's `Date` may be from `server_timestamp`, in either
///   direction. For most services, use [`default_allowed_mismatch()`].
///
/// # Errors
/// * [`SignatureError::MissingAuthenticationToken`] if there is no `Authorization` header.
/// * [`SignatureError::IncompleteSignature`] if the header is not a complete `Signature` value, or
///   does not cover `date` (and `digest` when there is a body).
/// * [`SignatureError::SignatureExpired`] if the `Date` is outside of the allowed window.
/// * [`SignatureError::SignatureDoesNotMatch`] if the body digest, the signing string or the
///   `keyId` do not match the signature.
pub fn verify_request<B>(
    request: &Request<B>,
    server_timestamp: DateTime<Utc>,
    allowed_mismatch: Duration,
) -> Result<Address, SignatureError>
where
    B: SignableBody,
{
    verify(
        request.method(),
        request.uri(),
        request.headers(),
        request.body().signable_bytes(),
        server_timestamp,
        allowed_mismatch,
    )
}

/// Verify signed request [`Parts`] and an optional body. See [`verify_request`].
pub fn verify_parts(
    parts: &Parts,
    body: Option<&[u8]>,
    server_timestamp: DateTime<Utc>,
    allowed_mismatch: Duration,
) -> Result<Address, SignatureError> {
    verify(&parts.method, &parts.uri, &parts.headers, body, server_timestamp, allowed_mismatch)
}

fn verify(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Option<&[u8]>,
    server_timestamp: DateTime<Utc>,
    allowed_mismatch: Duration,
) -> Result<Address, SignatureError> {
    let descriptor = authorization_descriptor(headers)?;
    trace!("Verifying signature: {:?}", descriptor);

    let signs = |name: &str| descriptor.headers().iter().any(|h| h.eq_ignore_ascii_case(name));
    if !signs(HDR_DATE) {
        return Err(SignatureError::IncompleteSignature(format!("Signed headers must include '{}'.", HDR_DATE)));
    }

    let signs_digest = signs(HDR_DIGEST);
    if body.is_some() && !signs_digest {
        return Err(SignatureError::IncompleteSignature(format!(
            "Signed headers must include '{}' for a request with a body.",
            HDR_DIGEST
        )));
    }

    check_timestamp(headers, server_timestamp, allowed_mismatch)?;

    if signs_digest {
        check_digest(headers, body.unwrap_or_default())?;
    }

    let to_sign = signing_string(method, uri, headers, descriptor.headers())?;
    let wrapped = wrap_personal_message(&to_sign);
    let signature = decode_signature(descriptor.signature())?;
    let recovered = signature.recover_address(&wrapped)?;

    let is_equal: bool = recovered.as_slice().ct_eq(descriptor.key_id().as_slice()).into();
    if !is_equal {
        trace!("Signature mismatch: keyId '{}', recovered '{}'", descriptor.key_id(), recovered);
        return Err(SignatureError::SignatureDoesNotMatch(Some(MSG_REQUEST_SIGNATURE_MISMATCH.to_string())));
    }

    Ok(recovered)
}

/// Extract the signature parameters from the `Authorization` header.
fn authorization_descriptor(headers: &HeaderMap) -> Result<SignatureDescriptor, SignatureError> {
    let Some(auth) = headers.get(AUTHORIZATION) else {
        trace!("No Authorization header");
        return Err(SignatureError::MissingAuthenticationToken(MSG_REQUEST_MISSING_AUTH_TOKEN.to_string()));
    };

    let auth = auth.to_str().map_err(|_| {
        SignatureError::MalformedHeader("Authorization header must contain only visible ASCII characters".to_string())
    })?;

    let scheme = auth.get(..AUTHORIZATION_SCHEME.len());
    if !scheme.is_some_and(|s| s.eq_ignore_ascii_case(AUTHORIZATION_SCHEME)) {
        return Err(SignatureError::IncompleteSignature(MSG_AUTH_HEADER_REQ_SIGNATURE_SCHEME.to_string()));
    }

    SignatureDescriptor::from_str(auth)
}

fn check_timestamp(
    headers: &HeaderMap,
    server_timestamp: DateTime<Utc>,
    allowed_mismatch: Duration,
) -> Result<(), SignatureError> {
    let Some(date) = headers.get(HDR_DATE) else {
        return Err(SignatureError::MissingHeader(HDR_DATE.to_string()));
    };
    let date = date.to_str().map_err(|_| {
        SignatureError::MalformedHeader(format!("Header '{}' must contain only visible ASCII characters", HDR_DATE))
    })?;
    let req_ts = parse_request_timestamp(date)?;

    let min_ts = server_timestamp.checked_sub_signed(allowed_mismatch).unwrap_or(server_timestamp);
    let max_ts = server_timestamp.checked_add_signed(allowed_mismatch).unwrap_or(server_timestamp);

    if req_ts < min_ts {
        trace!("Request timestamp {} is before minimum timestamp {}", req_ts, min_ts);
        return Err(SignatureError::SignatureExpired(format!(
            "Signature expired: {} is now earlier than {} ({} - {} minutes.)",
            date,
            min_ts.format(ISO8601_MILLIS_FORMAT),
            server_timestamp.format(ISO8601_MILLIS_FORMAT),
            allowed_mismatch.num_minutes()
        )));
    }

    if req_ts > max_ts {
        trace!("Request timestamp {} is after maximum timestamp {}", req_ts, max_ts);
        return Err(SignatureError::SignatureExpired(format!(
            "Signature not yet current: {} is still later than {} ({} + {} minutes.)",
            date,
            max_ts.format(ISO8601_MILLIS_FORMAT),
            server_timestamp.format(ISO8601_MILLIS_FORMAT),
            allowed_mismatch.num_minutes()
        )));
    }

    Ok(())
}

fn check_digest(headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
    let Some(digest) = headers.get(HDR_DIGEST) else {
        return Err(SignatureError::MissingHeader(HDR_DIGEST.to_string()));
    };

    let expected = body_digest(body);
    let is_equal: bool = digest.as_bytes().ct_eq(expected.as_bytes()).into();
    if !is_equal {
        trace!("Digest mismatch: expected '{}', got '{:?}'", expected, digest);
        return Err(SignatureError::SignatureDoesNotMatch(Some(MSG_DIGEST_MISMATCH.to_string())));
    }

    Ok(())
}

/// Decode a `0x`-prefixed `r || s || v` hex signature.
fn decode_signature(signature: &str) -> Result<RecoverableSignature, SignatureError> {
    let invalid = || {
        SignatureError::IncompleteSignature(format!(
            "'signature' must be {} bytes of 0x-prefixed hex: '{}'",
            SIGNATURE_LENGTH, signature
        ))
    };

    let hex_digits = signature.strip_prefix("0x").ok_or_else(invalid)?;
    let raw = hex::decode(hex_digits).map_err(|_| invalid())?;
    if raw.len() != SIGNATURE_LENGTH {
        return Err(invalid());
    }

    let signature = Signature::try_from(raw.as_slice()).map_err(|_| invalid())?;
    Ok(signature.into())
}
