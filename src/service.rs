//! A tower middleware that signs every request before handing it to the transport.

use {
    crate::{auth::RequestAuthenticator, body::SignableBody, signer::PersonalMessageSigner},
    http::request::Request,
    log::{debug, trace},
    std::{
        any::type_name,
        fmt::{Debug, Formatter, Result as FmtResult},
        future::{ready, Future},
        pin::Pin,
        sync::Arc,
        task::{Context, Poll},
    },
    tower::{BoxError, Layer, Service},
};

/// A [`Layer`] that wraps a transport service in [`SignRequest`].
pub struct SignRequestLayer<S> {
    authenticator: Arc<RequestAuthenticator<S>>,
}

impl<S> SignRequestLayer<S>
where
    S: PersonalMessageSigner,
{
    /// Create a layer that signs with `authenticator`.
    pub fn new(authenticator: RequestAuthenticator<S>) -> Self {
        Self::from_arc(Arc::new(authenticator))
    }

    /// Create a layer sharing an existing authenticator.
    pub fn from_arc(authenticator: Arc<RequestAuthenticator<S>>) -> Self {
        Self {
            authenticator,
        }
    }
}

impl<S> Clone for SignRequestLayer<S> {
    fn clone(&self) -> Self {
        Self {
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

impl<S> Debug for SignRequestLayer<S>
where
    S: PersonalMessageSigner,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("SignRequestLayer").field("authenticator", &self.authenticator).finish()
    }
}

impl<S, Inner> Layer<Inner> for SignRequestLayer<S> {
    type Service = SignRequest<S, Inner>;

    fn layer(&self, inner: Inner) -> Self::Service {
        SignRequest {
            authenticator: Arc::clone(&self.authenticator),
            inner,
        }
    }
}

/// Signs each request as of the current time, then calls the inner service.
///
/// If signing fails, the returned future resolves to the [`SignatureError`][crate::SignatureError]
/// (boxed) and the inner service is not called.
pub struct SignRequest<S, Inner> {
    authenticator: Arc<RequestAuthenticator<S>>,
    inner: Inner,
}

impl<S, Inner> SignRequest<S, Inner>
where
    S: PersonalMessageSigner,
{
    /// Wrap `inner`, signing with `authenticator`.
    pub fn new(authenticator: RequestAuthenticator<S>, inner: Inner) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            inner,
        }
    }

    /// Retrieve the inner service.
    #[inline(always)]
    pub fn get_ref(&self) -> &Inner {
        &self.inner
    }

    /// Retrieve the authenticator.
    #[inline(always)]
    pub fn authenticator(&self) -> &RequestAuthenticator<S> {
        &self.authenticator
    }
}

impl<S, Inner> Clone for SignRequest<S, Inner>
where
    Inner: Clone,
{
    fn clone(&self) -> Self {
        Self {
            authenticator: Arc::clone(&self.authenticator),
            inner: self.inner.clone(),
        }
    }
}

impl<S, Inner> Debug for SignRequest<S, Inner>
where
    S: PersonalMessageSigner,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("SignRequest")
            .field("authenticator", &self.authenticator)
            .field("inner", &type_name::<Inner>())
            .finish()
    }
}

impl<S, Inner, B> Service<Request<B>> for SignRequest<S, Inner>
where
    S: PersonalMessageSigner,
    B: SignableBody,
    Inner: Service<Request<B>>,
    Inner::Error: Into<BoxError>,
    Inner::Future: Send + 'static,
    Inner::Response: Send + 'static,
{
    type Response = Inner::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Inner::Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, c: &mut Context) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(c).map_err(Into::into)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        match self.authenticator.sign_request(&mut req) {
            Ok(descriptor) => {
                trace!("Signed {} {} as {}", req.method(), req.uri(), descriptor.key_id());
                let future = self.inner.call(req);
                Box::pin(async move { future.await.map_err(Into::into) })
            }
            Err(e) => {
                debug!("Not sending {} {}: {}", req.method(), req.uri(), e);
                Box::pin(ready(Err(e.into())))
            }
        }
    }
}
