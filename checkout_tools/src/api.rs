use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};

use crate::{config::CheckoutConfig, CheckoutApiError, CheckoutSession, NewCheckoutSession};

#[derive(Clone)]
pub struct CheckoutApi {
    config: CheckoutConfig,
    client: Arc<Client>,
}

impl CheckoutApi {
    pub fn new(config: CheckoutConfig) -> Result<Self, CheckoutApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.api_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| CheckoutApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    /// Creates a hosted checkout session for one payer.
    ///
    /// The call is bounded by the configured timeout. Any non-2xx answer (e.g. a non-positive amount) is returned as
    /// [`CheckoutApiError::QueryError`].
    pub async fn create_session(&self, session: &NewCheckoutSession) -> Result<CheckoutSession, CheckoutApiError> {
        let url = self.url("/v1/checkout/sessions");
        let params = session.to_form_params();
        trace!("💳️ Creating checkout session for {} with {} params", session.total(), params.len());
        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| CheckoutApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            let result =
                response.json::<CheckoutSession>().await.map_err(|e| CheckoutApiError::JsonError(e.to_string()))?;
            debug!("💳️ Checkout session {} created", result.id);
            Ok(result)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| CheckoutApiError::RequestError(e.to_string()))?;
            warn!("💳️ Checkout session request was rejected. {status}: {message}");
            Err(CheckoutApiError::QueryError { status, message })
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }
}
