//! Tests that exercise the whole signing pipeline across modules.

use {
    crate::{
        assemble_authorization, body_digest,
        constants::{TEST_ADDRESS, TEST_DATE, TEST_PRIVATE_KEY},
        default_allowed_mismatch, sign_wrapped, signing_string, verify_request, wrap_personal_message,
        PersonalMessageSigner, RequestAuthenticator, SerializedSigner, SignatureDescriptor,
    },
    alloy_signer_local::PrivateKeySigner,
    chrono::{DateTime, Utc},
    http::{
        header::{HeaderMap, HeaderValue, AUTHORIZATION},
        method::Method,
        request::Request,
        uri::Uri,
    },
    std::{str::FromStr, sync::Arc, thread},
};

const SECOND_PRIVATE_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const SECOND_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

fn timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(TEST_DATE).unwrap().with_timezone(&Utc)
}

fn test_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_str(TEST_PRIVATE_KEY).unwrap()
}

fn assert_send_sync<T: Send + Sync>() {}

#[test_log::test]
fn authenticator_is_send_sync() {
    assert_send_sync::<RequestAuthenticator<PrivateKeySigner>>();
    assert_send_sync::<RequestAuthenticator<Arc<SerializedSigner<PrivateKeySigner>>>>();
}

#[test_log::test]
fn pipeline_matches_authenticator() {
    // Run each stage by hand and compare against the one-shot authenticator.
    let signer = test_signer();
    let body = br#"{"hello":"world"}"#;
    let uri = Uri::from_static("https://api.example.com/v1/orders");

    let mut headers = HeaderMap::new();
    headers.insert("date", HeaderValue::from_static(TEST_DATE));
    headers.insert("digest", HeaderValue::from_str(&body_digest(body)).unwrap());

    let to_sign = signing_string(&Method::POST, &uri, &headers, &["date", "digest"]).unwrap();
    assert_eq!(
        to_sign,
        "(request-target): post /v1/orders\n\
         date: 2024-01-02T03:04:05.678Z\n\
         digest: SHA-256=k6I5cakU5erL8KjSUVTNownDwccvu5kU1Hxg88toFYg="
    );

    let wrapped = wrap_personal_message(&to_sign);
    let signature = sign_wrapped(&signer, &wrapped).unwrap();
    let manual = assemble_authorization(signer.address(), &["date", "digest"], &signature.signature_hex());

    let mut req = Request::post(uri).body(body.to_vec()).unwrap();
    RequestAuthenticator::new(test_signer()).sign_request_at(&mut req, timestamp()).unwrap();
    assert_eq!(req.headers()[AUTHORIZATION], manual.as_str());
}

#[test_log::test]
fn descriptor_recovers_signer() {
    let mut req = Request::get("https://api.example.com/v1/orders?limit=10").body(()).unwrap();
    RequestAuthenticator::new(test_signer()).sign_request_at(&mut req, timestamp()).unwrap();

    let descriptor = SignatureDescriptor::from_str(req.headers()[AUTHORIZATION].to_str().unwrap()).unwrap();
    assert_eq!(descriptor.key_id().to_string(), TEST_ADDRESS);
    assert_eq!(descriptor.headers(), &["date".to_string()]);
    assert_eq!(
        descriptor.signature(),
        "0x41515e59421a2b19594059d6d67480f9eb85367b07728e95f22df436d9b09d3c\
         7735a6ef0e1d8bb5fc8abc556af1f87baa63e322126965d86648993a347784a71c"
    );
}

#[test_log::test]
fn different_keys_verify_to_their_own_address() {
    let second = RequestAuthenticator::new(PrivateKeySigner::from_str(SECOND_PRIVATE_KEY).unwrap());
    assert_eq!(second.key_id().to_string(), SECOND_ADDRESS);

    let mut req = Request::put("https://api.example.com/v1/orders/17").body("cancel".to_string()).unwrap();
    second.sign_request_at(&mut req, timestamp()).unwrap();
    let address = verify_request(&req, timestamp(), default_allowed_mismatch()).unwrap();
    assert_eq!(address.to_string(), SECOND_ADDRESS);

    // Same request signed by the other key yields a different signature.
    let mut other = Request::put("https://api.example.com/v1/orders/17").body("cancel".to_string()).unwrap();
    RequestAuthenticator::new(test_signer()).sign_request_at(&mut other, timestamp()).unwrap();
    assert_ne!(req.headers()[AUTHORIZATION], other.headers()[AUTHORIZATION]);
}

#[test_log::test]
fn concurrent_signing_is_deterministic() {
    let authenticator = Arc::new(RequestAuthenticator::new(Arc::new(SerializedSigner::new(test_signer()))));
    assert_eq!(authenticator.signer().address().to_string(), TEST_ADDRESS);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let authenticator = Arc::clone(&authenticator);
            thread::spawn(move || {
                let body = format!(r#"{{"n":{}}}"#, i % 2);
                let mut req = Request::post("https://api.example.com/v1/orders").body(body).unwrap();
                authenticator.sign_request_at(&mut req, timestamp()).unwrap();
                (i % 2, req.headers()[AUTHORIZATION].clone())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (parity, value) in &results {
        for (other_parity, other_value) in &results {
            assert_eq!(parity == other_parity, value == other_value);
        }
    }
}
