use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use checkout_tools::webhook::{sign_payload, DEFAULT_TOLERANCE, SIGNATURE_HEADER};
use chrono::Utc;
use food_order_common::Secret;
use food_order_engine::{
    db_types::{GroupOrder, GroupOrderId},
    events::EventProducers,
    order_objects::PaymentConfirmation,
    test_utils::{
        fake_processor::FakePaymentProcessor,
        fixtures::{participant, seeded_database, share_confirmation},
        prepare_env::{drop_database, random_db_path},
    },
    traits::GroupOrderManagement,
    GroupOrderApi,
    OrderCheckoutApi,
    OrderFlowConfig,
    PaymentCallbackApi,
    SqliteDatabase,
};
use log::debug;
use serde_json::{json, Value};

use crate::{
    auth::{TokenIssuer, TokenValidator},
    config::AuthConfig,
    middleware::WebhookSignatureFactory,
    server::configure_routes,
};

// DO NOT re-use these secrets anywhere.
pub const JWT_SECRET: &str = "endpoint-tests-jwt-secret-0123456789abcdef";
pub const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(JWT_SECRET)
}

/// A bearer token for one of the fixture participants, e.g. `token_for("Alice")`.
pub fn token_for(name: &str) -> String {
    let token = TokenIssuer::new(&auth_config()).issue_token(&participant(name), None).expect("Failed to sign token");
    format!("Bearer {token}")
}

/// A real SQLite backend seeded with the Thai Garden menu, and a fake payment processor.
pub struct TestContext {
    pub db_url: String,
    pub db: SqliteDatabase,
    pub processor: FakePaymentProcessor,
    pub flow_config: OrderFlowConfig,
}

impl TestContext {
    pub async fn new() -> Self {
        let db_url = random_db_path();
        let db = seeded_database(&db_url).await;
        debug!("Created database: {db_url}");
        let flow_config = OrderFlowConfig::new("https://food.example.com");
        Self { db_url, db, processor: FakePaymentProcessor::new(), flow_config }
    }

    /// Sends the request through a freshly configured app. All state lives in the database and the processor, so
    /// consecutive calls see each other's effects.
    pub async fn call(&self, req: TestRequest) -> (StatusCode, String) {
        let group_api = GroupOrderApi::new(self.db.clone(), self.processor.clone(), self.flow_config.clone());
        let checkout_api = OrderCheckoutApi::new(self.db.clone(), self.processor.clone(), self.flow_config.clone());
        let callback_api = PaymentCallbackApi::new(self.db.clone(), EventProducers::default());
        let signature_checks = WebhookSignatureFactory::new(Secret::new(WEBHOOK_SECRET.to_string()), DEFAULT_TOLERANCE, true);
        let app = App::new()
            .app_data(web::Data::new(group_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(callback_api))
            .app_data(web::Data::new(TokenValidator::new(&auth_config())))
            .configure(|cfg| configure_routes::<SqliteDatabase, FakePaymentProcessor>(cfg, signature_checks));
        let service = test::init_service(app).await;
        match test::try_call_service(&service, req.to_request()).await {
            Ok(res) => {
                let status = res.status();
                let body = test::read_body(res).await;
                (status, String::from_utf8_lossy(&body).into_owned())
            },
            // Middleware rejections arrive as errors rather than responses
            Err(e) => (e.error_response().status(), e.to_string()),
        }
    }

    /// Starts a group order for the forty dollar cart and returns its id.
    pub async fn start_group_order(&self, initiator: &str) -> GroupOrderId {
        let body = json!({
            "cartItems": [
                { "menuItemId": "pad-thai", "name": "Pad Thai", "quantity": 2 },
                { "menuItemId": "spring-rolls", "name": "Spring Rolls", "quantity": "2" }
            ],
            "restaurantId": "thai-garden"
        });
        let req = TestRequest::post().uri("/api/order/group").insert_header(("Authorization", token_for(initiator))).set_json(body);
        let (status, body) = self.call(req).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let created: Value = serde_json::from_str(&body).expect("Not JSON");
        GroupOrderId::from(created["groupOrderId"].as_str().expect("No group order id"))
    }

    pub async fn group_order(&self, id: &GroupOrderId) -> GroupOrder {
        self.db.fetch_group_order(id).await.expect("Error fetching group order").expect("Group order is missing")
    }

    /// Has `name` pay their share by way of a signed webhook call.
    pub async fn pay_share(&self, id: &GroupOrderId, name: &str) -> (StatusCode, String) {
        let record = self.group_order(id).await;
        let confirmation = share_confirmation(&record, &participant(name));
        self.call(signed_webhook(&completed_event(&confirmation))).await
    }

    pub async fn tear_down(self) {
        self.db.pool().close().await;
        drop_database(&self.db_url).await;
    }
}

pub fn join_request(id: &GroupOrderId, name: &str) -> TestRequest {
    let payer = participant(name);
    let body = json!({
        "deliveryDetails": {
            "email": payer.email,
            "name": name,
            "addressLine1": "742 Evergreen Terrace",
            "city": "Springfield"
        }
    });
    TestRequest::post().uri(&format!("/api/order/join-group/{id}")).insert_header(("Authorization", token_for(name))).set_json(body)
}

/// The `checkout.session.completed` event the processor sends once `confirmation` is paid.
pub fn completed_event(confirmation: &PaymentConfirmation) -> Value {
    json!({
        "id": confirmation.event_id,
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": confirmation.session_id,
                "amount_total": confirmation.amount_total.value(),
                "customer_details": { "email": confirmation.payer_email, "name": confirmation.metadata.payer_name },
                "metadata": confirmation.metadata.to_map()
            }
        }
    })
}

pub fn signed_webhook(event: &Value) -> TestRequest {
    let payload = event.to_string();
    let signature = sign_payload(payload.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp());
    TestRequest::post()
        .uri("/api/order/checkout/webhook")
        .insert_header(("Content-Type", "application/json"))
        .insert_header((SIGNATURE_HEADER, signature))
        .set_payload(payload)
}

pub fn json_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
