//! Request signing: the client side of the protocol.
//!
//! [`RequestAuthenticator`] orchestrates one signing attempt per request:
//!
//! 1. The `Date` header is set to the current time, replacing anything the caller put there.
//! 2. If the request has a body, a `Digest` header is computed and added to the signed headers.
//! 3. The signing string is built over the signed headers.
//! 4. The string is wrapped in the personal-message envelope and signed.
//! 5. The `Authorization` header is assembled.
//!
//! All of this happens against a staged copy of the headers. The request itself is only modified
//! once the `Authorization` value exists, so a failed attempt leaves the request exactly as it
//! was and it must not be sent.

use {
    crate::{
        body::SignableBody,
        canonical::signing_string,
        chronoutil::format_request_timestamp,
        constants::*,
        crypto::body_digest,
        message::wrap_personal_message,
        signature::SignatureDescriptor,
        signer::{sign_wrapped, PersonalMessageSigner},
        SignatureError,
    },
    alloy_primitives::Address,
    chrono::{DateTime, Utc},
    derive_builder::Builder,
    http::{
        header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, DATE, USER_AGENT},
        method::Method,
        request::{Parts, Request},
        uri::Uri,
    },
    log::{debug, trace},
    qualifier_attr::qualifiers,
    std::fmt::{Debug, Formatter, Result as FmtResult},
};

/// Options that can be used to configure request signing.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(derive(Debug), build_fn(validate = "Self::validate"))]
pub struct SigningOptions {
    /// Also set the `Accept`, `User-Agent` and `Content-Type` headers when the request does not
    /// already carry them. These are not signed unless listed in `extra_signed_headers`.
    #[builder(default = "true")]
    conventional_headers: bool,

    /// The `User-Agent` value used when `conventional_headers` is set.
    #[builder(setter(into), default = "default_user_agent()")]
    user_agent: String,

    /// Additional headers to sign, after `date` and (when there is a body) `digest`. They must be
    /// present on the request when it is signed.
    #[builder(setter(into), default)]
    extra_signed_headers: Vec<HeaderName>,
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for SigningOptions {
    fn default() -> Self {
        Self {
            conventional_headers: true,
            user_agent: default_user_agent(),
            extra_signed_headers: Vec::new(),
        }
    }
}

impl SigningOptions {
    /// Create a builder for `SigningOptions`.
    #[inline(always)]
    pub fn builder() -> SigningOptionsBuilder {
        SigningOptionsBuilder::default()
    }

    /// Options that sign only `date` and `digest` and leave all other headers alone.
    pub fn minimal() -> Self {
        Self {
            conventional_headers: false,
            ..Self::default()
        }
    }

    /// Whether conventional headers are set.
    #[inline(always)]
    pub fn conventional_headers(&self) -> bool {
        self.conventional_headers
    }

    /// Retrieve the `User-Agent` value.
    #[inline(always)]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Retrieve the additional headers to sign.
    #[inline(always)]
    pub fn extra_signed_headers(&self) -> &[HeaderName] {
        &self.extra_signed_headers
    }
}

impl SigningOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(user_agent) = &self.user_agent {
            if HeaderValue::from_str(user_agent).is_err() {
                return Err(format!("Invalid User-Agent value: {:?}", user_agent));
            }
        }

        if let Some(extra) = &self.extra_signed_headers {
            if extra.contains(&AUTHORIZATION) {
                return Err("The authorization header cannot sign itself".to_string());
            }
        }

        Ok(())
    }
}

/// Progress of a single signing attempt.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SigningStage {
    Idle,
    HeadersPrepared,
    StringBuilt,
    Wrapped,
    Signed,
    Assembled,
}

/// Headers computed by a successful signing attempt, not yet applied to the request.
struct PreparedSignature {
    conventional: Vec<(HeaderName, HeaderValue)>,
    date: HeaderValue,
    digest: Option<HeaderValue>,
    authorization: HeaderValue,
    descriptor: SignatureDescriptor,
}

impl PreparedSignature {
    fn apply(self, headers: &mut HeaderMap) -> SignatureDescriptor {
        for (name, value) in self.conventional {
            headers.insert(name, value);
        }

        headers.insert(DATE, self.date);
        if let Some(digest) = self.digest {
            headers.insert(HeaderName::from_static(HDR_DIGEST), digest);
        }
        headers.insert(AUTHORIZATION, self.authorization);
        self.descriptor
    }
}

/// Signs outgoing requests with a holder's [`PersonalMessageSigner`].
///
/// The authenticator holds no per-request state; one instance can sign any number of requests,
/// concurrently if the signer allows it.
pub struct RequestAuthenticator<S> {
    signer: S,
    options: SigningOptions,
}

impl<S> Debug for RequestAuthenticator<S>
where
    S: PersonalMessageSigner,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("RequestAuthenticator")
            .field("key_id", &format_args!("{}", self.signer.address()))
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S> RequestAuthenticator<S>
where
    S: PersonalMessageSigner,
{
    /// Create an authenticator with default [`SigningOptions`].
    pub fn new(signer: S) -> Self {
        Self::with_options(signer, SigningOptions::default())
    }

    /// Create an authenticator with the given options.
    pub fn with_options(signer: S, options: SigningOptions) -> Self {
        Self {
            signer,
            options,
        }
    }

    /// The address that signatures recover to; this is the `keyId` of every signature.
    #[inline(always)]
    pub fn key_id(&self) -> Address {
        self.signer.address()
    }

    /// Retrieve the signing options.
    #[inline(always)]
    pub fn options(&self) -> &SigningOptions {
        &self.options
    }

    /// Retrieve the signer.
    #[inline(always)]
    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Sign `request` as of now.
    ///
    /// On success the `Date`, `Authorization` and (for requests with a body) `Digest` headers are
    /// set and the signature parameters are returned. On failure the request is left unmodified.
    pub fn sign_request<B>(&self, request: &mut Request<B>) -> Result<SignatureDescriptor, SignatureError>
    where
        B: SignableBody,
    {
        self.sign_request_at(request, Utc::now())
    }

    /// Sign `request` as of `timestamp`.
    pub fn sign_request_at<B>(
        &self,
        request: &mut Request<B>,
        timestamp: DateTime<Utc>,
    ) -> Result<SignatureDescriptor, SignatureError>
    where
        B: SignableBody,
    {
        let prepared =
            self.prepare(request.method(), request.uri(), request.headers(), request.body().signable_bytes(), timestamp)?;
        Ok(prepared.apply(request.headers_mut()))
    }

    /// Sign request [`Parts`] and an optional body as of `timestamp`.
    pub fn sign_parts_at(
        &self,
        parts: &mut Parts,
        body: Option<&[u8]>,
        timestamp: DateTime<Utc>,
    ) -> Result<SignatureDescriptor, SignatureError> {
        let prepared = self.prepare(&parts.method, &parts.uri, &parts.headers, body, timestamp)?;
        Ok(prepared.apply(&mut parts.headers))
    }

    fn prepare(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        timestamp: DateTime<Utc>,
    ) -> Result<PreparedSignature, SignatureError> {
        let mut stage = SigningStage::Idle;
        let result = self.run_stages(method, uri, headers, body, timestamp, &mut stage);
        if let Err(ref e) = result {
            debug!("Signing {} {} failed at stage {:?}: {}", method, uri, stage, e);
        }
        result
    }

    fn run_stages(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        timestamp: DateTime<Utc>,
        stage: &mut SigningStage,
    ) -> Result<PreparedSignature, SignatureError> {
        let mut staged = headers.clone();

        let conventional = self.conventional_headers(headers, body.is_some())?;
        for (name, value) in &conventional {
            staged.insert(name.clone(), value.clone());
        }

        let date = HeaderValue::from_str(&format_request_timestamp(&timestamp))
            .map_err(|e| SignatureError::MalformedHeader(format!("Unable to encode Date header: {}", e)))?;
        staged.insert(DATE, date.clone());
        let mut required: Vec<HeaderName> = vec![DATE];

        let digest = match body {
            Some(body) => {
                let digest = HeaderValue::from_str(&body_digest(body))
                    .map_err(|e| SignatureError::MalformedHeader(format!("Unable to encode Digest header: {}", e)))?;
                let name = HeaderName::from_static(HDR_DIGEST);
                staged.insert(name.clone(), digest.clone());
                required.push(name);
                Some(digest)
            }
            None => None,
        };

        for name in &self.options.extra_signed_headers {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }
        advance(stage, SigningStage::HeadersPrepared);

        let to_sign = signing_string(method, uri, &staged, &required)?;
        advance(stage, SigningStage::StringBuilt);

        let wrapped = wrap_personal_message(&to_sign);
        advance(stage, SigningStage::Wrapped);

        let signature = sign_wrapped(&self.signer, &wrapped)?;
        advance(stage, SigningStage::Signed);

        let descriptor = SignatureDescriptor::new(self.signer.address(), &required, signature.signature_hex());
        let authorization = HeaderValue::from_str(&descriptor.authorization_value())
            .map_err(|e| SignatureError::MalformedHeader(format!("Unable to encode Authorization header: {}", e)))?;
        advance(stage, SigningStage::Assembled);

        Ok(PreparedSignature {
            conventional,
            date,
            digest,
            authorization,
            descriptor,
        })
    }

    /// The conventional headers the request is missing.
    fn conventional_headers(
        &self,
        headers: &HeaderMap,
        has_body: bool,
    ) -> Result<Vec<(HeaderName, HeaderValue)>, SignatureError> {
        let mut result = Vec::new();
        if !self.options.conventional_headers {
            return Ok(result);
        }

        let user_agent = HeaderValue::from_str(&self.options.user_agent)
            .map_err(|_| SignatureError::MalformedHeader(format!("Invalid User-Agent value: {:?}", self.options.user_agent)))?;

        let mut candidates = vec![(ACCEPT, HeaderValue::from_static(APPLICATION_JSON_ACCEPT)), (USER_AGENT, user_agent)];
        if has_body {
            candidates.push((CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON)));
        }

        for (name, value) in candidates {
            if !headers.contains_key(&name) {
                result.push((name, value));
            }
        }

        Ok(result)
    }
}

fn advance(stage: &mut SigningStage, next: SigningStage) {
    trace!("Signing stage {:?} -> {:?}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use {
        super::{RequestAuthenticator, SigningOptions},
        crate::{
            constants::{TEST_ADDRESS, TEST_DATE, TEST_PRIVATE_KEY},
            PersonalMessageSigner, SignatureError,
        },
        alloy_primitives::{Address, Signature},
        alloy_signer_local::PrivateKeySigner,
        chrono::{DateTime, Utc},
        http::{
            header::{HeaderName, HeaderValue, AUTHORIZATION},
            request::Request,
        },
        std::str::FromStr,
        tower::BoxError,
    };

    struct UnpluggedSigner;

    impl PersonalMessageSigner for UnpluggedSigner {
        fn address(&self) -> Address {
            Address::ZERO
        }

        fn sign_personal_message(&self, _message: &[u8]) -> Result<Signature, BoxError> {
            Err("device not connected".into())
        }
    }

    fn authenticator() -> RequestAuthenticator<PrivateKeySigner> {
        RequestAuthenticator::new(PrivateKeySigner::from_str(TEST_PRIVATE_KEY).unwrap())
    }

    fn timestamp() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(TEST_DATE).unwrap().with_timezone(&Utc)
    }

    #[test_log::test]
    fn sign_get_without_body() {
        let auth = authenticator();
        let mut req = Request::get("https://api.example.com/v1/orders?limit=10").body(()).unwrap();
        let descriptor = auth.sign_request_at(&mut req, timestamp()).unwrap();

        assert_eq!(descriptor.headers(), &["date".to_string()]);
        assert_eq!(descriptor.key_id().to_string(), TEST_ADDRESS);
        assert_eq!(req.headers()["date"], "2024-01-02T03:04:05.678Z");
        assert!(req.headers().get("digest").is_none());
        assert!(req.headers().get("content-type").is_none());
        assert_eq!(req.headers()["accept"], "application/json, text/plain, */*");
        assert_eq!(req.headers()["user-agent"], concat!("eth-http-signature/", env!("CARGO_PKG_VERSION")));
        assert_eq!(
            req.headers()[AUTHORIZATION],
            "Signature keyId=\"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\",algorithm=\"keccak-256\",\
             headers=\"date\",signature=\"0x41515e59421a2b19594059d6d67480f9eb85367b07728e95f22df436d9b09d3c\
             7735a6ef0e1d8bb5fc8abc556af1f87baa63e322126965d86648993a347784a71c\""
        );
    }

    #[test_log::test]
    fn sign_post_with_body() {
        let auth = authenticator();
        let mut req = Request::post("https://api.example.com/v1/orders").body(r#"{"hello":"world"}"#).unwrap();
        let descriptor = auth.sign_request_at(&mut req, timestamp()).unwrap();

        assert_eq!(descriptor.headers(), &["date".to_string(), "digest".to_string()]);
        assert_eq!(req.headers()["digest"], "SHA-256=k6I5cakU5erL8KjSUVTNownDwccvu5kU1Hxg88toFYg=");
        assert_eq!(req.headers()["content-type"], "application/json");
        assert_eq!(
            req.headers()[AUTHORIZATION],
            "Signature keyId=\"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\",algorithm=\"keccak-256\",\
             headers=\"date digest\",signature=\"0x0d514394e616cd386ccc925862d0933f8d0f17a31c69e0cc1f5c603056a256c1\
             08b5a64a60d617a8b5291fd4c642a6b8c4f6a6ad2d71ba052d3d11869f1c8e031c\""
        );
    }

    #[test_log::test]
    fn sign_is_deterministic_for_fixed_timestamp() {
        let auth = authenticator();
        let mut a = Request::post("https://api.example.com/v1/orders").body(b"payload".to_vec()).unwrap();
        let mut b = Request::post("https://api.example.com/v1/orders").body(b"payload".to_vec()).unwrap();
        auth.sign_request_at(&mut a, timestamp()).unwrap();
        auth.sign_request_at(&mut b, timestamp()).unwrap();
        assert_eq!(a.headers()[AUTHORIZATION], b.headers()[AUTHORIZATION]);

        // Re-signing the same request replaces the previous signature without changing it.
        auth.sign_request_at(&mut a, timestamp()).unwrap();
        assert_eq!(a.headers()[AUTHORIZATION], b.headers()[AUTHORIZATION]);
        assert_eq!(a.headers().get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test_log::test]
    fn sign_overwrites_caller_date() {
        let auth = authenticator();
        let mut req = Request::get("https://api.example.com/v1/orders?limit=10")
            .header("Date", "1999-12-31T23:59:59.999Z")
            .body(())
            .unwrap();
        auth.sign_request_at(&mut req, timestamp()).unwrap();
        assert_eq!(req.headers()["date"], "2024-01-02T03:04:05.678Z");
        assert_eq!(req.headers().get_all("date").iter().count(), 1);
    }

    #[test_log::test]
    fn sign_empty_body_still_digested() {
        let auth = authenticator();
        let mut req = Request::post("https://api.example.com/v1/orders").body(String::new()).unwrap();
        let descriptor = auth.sign_request_at(&mut req, timestamp()).unwrap();
        assert_eq!(descriptor.headers(), &["date".to_string(), "digest".to_string()]);
        assert_eq!(req.headers()["digest"], "SHA-256=47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }

    #[test_log::test]
    fn sign_keeps_caller_conventional_headers() {
        let auth = authenticator();
        let mut req = Request::post("https://api.example.com/v1/orders")
            .header("Content-Type", "text/plain")
            .header("User-Agent", "my-bot/1.0")
            .body("hi")
            .unwrap();
        auth.sign_request_at(&mut req, timestamp()).unwrap();
        assert_eq!(req.headers()["content-type"], "text/plain");
        assert_eq!(req.headers()["user-agent"], "my-bot/1.0");
    }

    #[test_log::test]
    fn sign_minimal_options() {
        let auth = RequestAuthenticator::with_options(
            PrivateKeySigner::from_str(TEST_PRIVATE_KEY).unwrap(),
            SigningOptions::minimal(),
        );
        let mut req = Request::post("https://api.example.com/v1/orders").body("hi").unwrap();
        auth.sign_request_at(&mut req, timestamp()).unwrap();
        let mut names: Vec<_> = req.headers().keys().map(|k| k.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["authorization", "date", "digest"]);
    }

    #[test_log::test]
    fn sign_extra_signed_headers() {
        let options = SigningOptions::builder()
            .extra_signed_headers(vec![HeaderName::from_static("content-type"), HeaderName::from_static("date")])
            .build()
            .unwrap();
        let auth = RequestAuthenticator::with_options(PrivateKeySigner::from_str(TEST_PRIVATE_KEY).unwrap(), options);
        let mut req = Request::post("https://api.example.com/v1/orders").body("hi").unwrap();
        let descriptor = auth.sign_request_at(&mut req, timestamp()).unwrap();

        // Date is not repeated; the conventional Content-Type is present in time to be signed.
        assert_eq!(descriptor.headers(), &["date".to_string(), "digest".to_string(), "content-type".to_string()]);
        assert!(req.headers()[AUTHORIZATION].to_str().unwrap().contains(r#"headers="date digest content-type""#));
    }

    #[test_log::test]
    fn sign_missing_extra_header_fails_closed() {
        let options = SigningOptions::builder()
            .conventional_headers(false)
            .extra_signed_headers(vec![HeaderName::from_static("x-request-id")])
            .build()
            .unwrap();
        let auth = RequestAuthenticator::with_options(PrivateKeySigner::from_str(TEST_PRIVATE_KEY).unwrap(), options);
        let mut req = Request::post("https://api.example.com/v1/orders").body("hi").unwrap();
        let e = auth.sign_request_at(&mut req, timestamp()).unwrap_err();

        match e {
            SignatureError::MissingHeader(ref name) => assert_eq!(name, "x-request-id"),
            _ => panic!("Expected MissingHeader; got {:?}", e),
        }
        assert!(req.headers().is_empty());
    }

    #[test_log::test]
    fn sign_failure_leaves_request_untouched() {
        let auth = RequestAuthenticator::new(UnpluggedSigner);
        let mut req = Request::post("https://api.example.com/v1/orders")
            .header("Date", "1999-12-31T23:59:59.999Z")
            .body("hi")
            .unwrap();
        let before = req.headers().clone();

        let e = auth.sign_request_at(&mut req, timestamp()).unwrap_err();
        assert_eq!(e.error_code(), "SigningUnavailable");
        assert_eq!(req.headers(), &before);
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test_log::test]
    fn sign_malformed_url() {
        let auth = authenticator();
        let mut req = Request::options("*").body(()).unwrap();
        let e = auth.sign_request_at(&mut req, timestamp()).unwrap_err();
        assert_eq!(e.error_code(), "MalformedUrl");
        assert!(req.headers().is_empty());
    }

    #[test_log::test]
    fn sign_parts() {
        let auth = authenticator();
        let req = Request::get("https://api.example.com/v1/orders?limit=10").body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        auth.sign_parts_at(&mut parts, None, timestamp()).unwrap();

        let mut req = Request::get("https://api.example.com/v1/orders?limit=10").body(()).unwrap();
        auth.sign_request_at(&mut req, timestamp()).unwrap();
        assert_eq!(parts.headers[AUTHORIZATION], req.headers()[AUTHORIZATION]);
    }

    #[test_log::test]
    fn sign_now_uses_fresh_date() {
        let auth = authenticator();
        let before = Utc::now();
        let mut req = Request::get("https://api.example.com/v1/orders").body(()).unwrap();
        auth.sign_request(&mut req).unwrap();
        let date = req.headers()["date"].to_str().unwrap();
        let signed = DateTime::parse_from_rfc3339(date).unwrap().with_timezone(&Utc);
        assert!(signed <= Utc::now());
        assert!(signed >= before - chrono::Duration::milliseconds(1));
    }

    #[test_log::test]
    fn options_validation() {
        let e = SigningOptions::builder().user_agent("bad\nagent").build().unwrap_err();
        assert!(e.to_string().contains("Invalid User-Agent value"), "{}", e);

        let e = SigningOptions::builder().extra_signed_headers(vec![AUTHORIZATION]).build().unwrap_err();
        assert!(e.to_string().contains("cannot sign itself"), "{}", e);

        let options = SigningOptions::builder().build().unwrap();
        assert_eq!(options, SigningOptions::default());
        assert!(options.conventional_headers());
        assert!(options.extra_signed_headers().is_empty());
        assert!(HeaderValue::from_str(options.user_agent()).is_ok());
    }

    #[test_log::test]
    fn debug_does_not_leak_key() {
        let auth = authenticator();
        let debug = format!("{:?}", auth);
        assert!(debug.contains(TEST_ADDRESS), "{}", debug);
        assert!(!debug.contains(TEST_PRIVATE_KEY), "{}", debug);
        assert_eq!(auth.key_id().to_string(), TEST_ADDRESS);
        assert_eq!(auth.signer().address().to_string(), TEST_ADDRESS);
        assert!(auth.options().conventional_headers());
    }
}
