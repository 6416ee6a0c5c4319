use std::sync::{Arc, Mutex};

use crate::traits::{CheckoutSessionHandle, CheckoutSessionRequest, PaymentProcessor, SessionCreationError};

#[derive(Debug, Default)]
struct FakeState {
    requests: Vec<CheckoutSessionRequest>,
    fail_with: Option<SessionCreationError>,
}

/// An in-process payment processor. It records every request and hands out predictable session ids and URLs, or
/// fails every request once [`FakePaymentProcessor::fail_with`] has been called.
#[derive(Debug, Clone, Default)]
pub struct FakePaymentProcessor {
    state: Arc<Mutex<FakeState>>,
}

impl FakePaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: SessionCreationError) {
        self.state.lock().unwrap().fail_with = Some(error);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().fail_with = None;
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

impl PaymentProcessor for FakePaymentProcessor {
    async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionHandle, SessionCreationError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = &state.fail_with {
            return Err(e.clone());
        }
        state.requests.push(request);
        let n = state.requests.len();
        Ok(CheckoutSessionHandle {
            session_id: format!("cs_test_{n}"),
            url: format!("https://checkout.test/session/cs_test_{n}"),
        })
    }
}
