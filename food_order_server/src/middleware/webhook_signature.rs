//! Webhook signature middleware for Actix Web.
//!
//! The payment processor signs every callback with the endpoint's webhook secret. The signature covers the exact
//! bytes of the request body, so it has to be checked before anything deserializes the payload. This middleware reads
//! the body, checks it against the signature header and puts the body back for the handler.
//!
//! Requests with a missing or invalid signature are rejected with a 400, and the handler is never called.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorBadRequest,
    web,
    Error,
};
use checkout_tools::webhook::{verify_signature, SIGNATURE_HEADER};
use chrono::{Duration, Utc};
use food_order_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

pub struct WebhookSignatureFactory {
    secret: Secret<String>,
    tolerance: Duration,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl WebhookSignatureFactory {
    pub fn new(secret: Secret<String>, tolerance: Duration, enabled: bool) -> Self {
        WebhookSignatureFactory { secret, tolerance, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookSignatureFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = WebhookSignatureService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookSignatureService {
            secret: self.secret.clone(),
            tolerance: self.tolerance,
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct WebhookSignatureService<S> {
    secret: Secret<String>,
    tolerance: Duration,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookSignatureService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let tolerance = self.tolerance;
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            if !enabled {
                trace!("🔐️ Webhook signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let header = req
                .headers()
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    warn!("🔐️ No webhook signature found in request. Rejecting it.");
                    ErrorBadRequest("Webhook Error: No signature found.")
                })?
                .to_string();
            match verify_signature(data.as_ref(), &header, &secret, tolerance, Utc::now()) {
                Ok(()) => {
                    trace!("🔐️ Webhook signature check ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Invalid webhook signature. Rejecting request. {e}");
                    Err(ErrorBadRequest(format!("Webhook Error: {e}")))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
