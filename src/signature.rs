//! Assembly and parsing of the `Authorization` header value.
//!
//! The wire format is
//!
//! ```text
//! Signature keyId="0xf39F…2266",algorithm="keccak-256",headers="date digest",signature="0x…1c"
//! ```
//!
//! Fields always appear in this order, comma-joined without whitespace. The algorithm is fixed.

use {
    crate::{constants::*, SignatureError},
    alloy_primitives::Address,
    derive_builder::Builder,
    lazy_static::lazy_static,
    regex::Regex,
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

lazy_static! {
    /// A single `name="value"` signature parameter.
    static ref SIGNATURE_PARAM: Regex = Regex::new(r#"^\s*(?P<name>[A-Za-z]+)="(?P<value>[^"]*)"\s*$"#).unwrap();
}

/// The parameters of a request signature: who signed, which headers were covered, and the
/// signature itself.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(derive(Debug))]
pub struct SignatureDescriptor {
    /// The address of the signer.
    key_id: Address,

    /// The signed header names, in signing-string order.
    #[builder(setter(into))]
    headers: Vec<String>,

    /// The `0x`-prefixed hex signature.
    #[builder(setter(into))]
    signature: String,
}

impl SignatureDescriptor {
    /// Create a builder for `SignatureDescriptor`.
    #[inline(always)]
    pub fn builder() -> SignatureDescriptorBuilder {
        SignatureDescriptorBuilder::default()
    }

    /// Create a descriptor from its parts.
    pub fn new<N: AsRef<str>>(key_id: Address, headers: &[N], signature: impl Into<String>) -> Self {
        Self {
            key_id,
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            signature: signature.into(),
        }
    }

    /// Retrieve the signer address.
    #[inline(always)]
    pub fn key_id(&self) -> Address {
        self.key_id
    }

    /// Retrieve the algorithm name. This is always `keccak-256`.
    #[inline(always)]
    pub fn algorithm(&self) -> &'static str {
        KECCAK_256
    }

    /// Retrieve the signed header names, in signing-string order.
    #[inline(always)]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Retrieve the `0x`-prefixed hex signature.
    #[inline(always)]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The complete value of the `Authorization` header, including the `Signature ` scheme prefix.
    pub fn authorization_value(&self) -> String {
        format!("{}{}", AUTHORIZATION_SCHEME, self)
    }
}

impl Display for SignatureDescriptor {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            r#"{}="{}",{}="{}",{}="{}",{}="{}""#,
            PARAM_KEY_ID,
            self.key_id,
            PARAM_ALGORITHM,
            KECCAK_256,
            PARAM_HEADERS,
            self.headers.join(" "),
            PARAM_SIGNATURE,
            self.signature
        )
    }
}

impl FromStr for SignatureDescriptor {
    type Err = SignatureError;

    /// Parse an `Authorization` header value. The `Signature ` prefix is optional. Parameters other
    /// than `keyId`, `algorithm`, `headers` and `signature` are ignored.
    fn from_str(s: &str) -> Result<Self, SignatureError> {
        let params = s.trim_start();
        let params = match params.get(..AUTHORIZATION_SCHEME.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(AUTHORIZATION_SCHEME) => &params[AUTHORIZATION_SCHEME.len()..],
            _ => params,
        };

        let mut builder = SignatureDescriptor::builder();
        let mut algorithm = None;

        for param in params.split(',') {
            let Some(cap) = SIGNATURE_PARAM.captures(param) else {
                return Err(SignatureError::IncompleteSignature(format!(
                    "Authorization header parameter is malformed: '{}'",
                    param.trim()
                )));
            };

            let value = &cap["value"];
            match &cap["name"] {
                PARAM_KEY_ID => {
                    let key_id = Address::from_str(value).map_err(|_| {
                        SignatureError::IncompleteSignature(format!("'keyId' is not a valid address: '{}'", value))
                    })?;
                    builder.key_id(key_id);
                }
                PARAM_ALGORITHM => algorithm = Some(value.to_string()),
                PARAM_HEADERS => {
                    builder.headers(value.split_ascii_whitespace().map(str::to_string).collect::<Vec<_>>());
                }
                PARAM_SIGNATURE => {
                    builder.signature(value);
                }
                _ => (),
            }
        }

        match algorithm.as_deref() {
            Some(KECCAK_256) => (),
            Some(other) => {
                return Err(SignatureError::IncompleteSignature(format!("{}'{}'", MSG_UNSUPPORTED_ALGORITHM, other)))
            }
            None => {
                return Err(SignatureError::IncompleteSignature(
                    "Authorization header requires 'algorithm' parameter.".to_string(),
                ))
            }
        }

        builder.build().map_err(|e| match e {
            SignatureDescriptorBuilderError::UninitializedField(field) => {
                let param = match field {
                    "key_id" => PARAM_KEY_ID,
                    "headers" => PARAM_HEADERS,
                    _ => PARAM_SIGNATURE,
                };
                SignatureError::IncompleteSignature(format!("Authorization header requires '{}' parameter.", param))
            }
            SignatureDescriptorBuilderError::ValidationError(msg) => SignatureError::IncompleteSignature(msg),
        })
    }
}

/// Assemble the `Authorization` header value from the signer address, the signed header names
/// and the hex signature.
pub fn assemble_authorization<N: AsRef<str>>(key_id: Address, required_header_names: &[N], signature_hex: &str) -> String {
    SignatureDescriptor::new(key_id, required_header_names, signature_hex).authorization_value()
}
