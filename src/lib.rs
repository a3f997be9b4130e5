//! The `eth_http_signature` crate signs HTTP requests with an Ethereum key, and verifies them.
//!
//! A request is signed by building a canonical signing string from the request line and a list of
//! headers, wrapping it in the personal-message envelope, and signing it with a key that never
//! leaves the holder's [`PersonalMessageSigner`]. The result is carried in the `Authorization`
//! header:
//!
//! ```text
//! Authorization: Signature keyId="0xf39F…2266",algorithm="keccak-256",headers="date digest",signature="0x…1c"
//! ```
//!
//! The server rebuilds the same string, recovers the signer address from the signature and
//! compares it with `keyId`. There are no shared secrets.
//!
//! # Workflow
//! 1. Create a [`RequestAuthenticator`] around your signing capability.
//! 2. Call [`sign_request`][RequestAuthenticator::sign_request] on each outgoing request, or wrap
//!    your transport in a [`SignRequestLayer`].
//! 3. On the receiving side, call [`verify_request`] to obtain the signer address.
//!
//! ## Example
//! ```rust
//! use alloy_signer_local::PrivateKeySigner;
//! use chrono::Utc;
//! use eth_http_signature::{default_allowed_mismatch, verify_request, RequestAuthenticator};
//! use http::Request;
//! use std::str::FromStr;
//!
//! // Well-known development key; never use it for real funds.
//! let signer =
//!     PrivateKeySigner::from_str("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80").unwrap();
//! let authenticator = RequestAuthenticator::new(signer);
//!
//! let mut request = Request::post("https://ethereum.mainnet.api.dexible.io/v1/orders")
//!     .body(r#"{"amount":"1000"}"#.to_string())
//!     .unwrap();
//! authenticator.sign_request(&mut request).unwrap();
//! assert!(request.headers().contains_key("authorization"));
//! assert!(request.headers().contains_key("digest"));
//!
//! let address = verify_request(&request, Utc::now(), default_allowed_mismatch()).unwrap();
//! assert_eq!(address, authenticator.key_id());
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

mod auth;
mod body;
mod canonical;
mod chronoutil;
mod constants;
mod crypto;
mod endpoint;
mod error;
mod message;
mod service;
mod signature;
mod signer;
mod verify;

pub use crate::{
    auth::{RequestAuthenticator, SigningOptions, SigningOptionsBuilder, SigningOptionsBuilderError},
    body::SignableBody,
    canonical::{parse_url, request_target, signing_string},
    crypto::body_digest,
    endpoint::{chain_name, ApiEndpoint},
    error::SignatureError,
    message::wrap_personal_message,
    service::{SignRequest, SignRequestLayer},
    signature::{assemble_authorization, SignatureDescriptor, SignatureDescriptorBuilder, SignatureDescriptorBuilderError},
    signer::{sign_wrapped, PersonalMessageSigner, RecoverableSignature, SerializedSigner},
    verify::{default_allowed_mismatch, verify_parts, verify_request},
};

#[cfg(test)]
mod unittest;
