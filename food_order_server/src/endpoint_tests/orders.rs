use actix_web::{http::StatusCode, test::TestRequest};
use food_order_common::Cents;
use food_order_engine::{
    db_types::{OrderId, OrderStatus},
    order_objects::PaymentConfirmation,
    traits::{OrderManagement, SessionCreationError},
};
use serde_json::{json, Value};

use super::helpers::{completed_event, json_body, signed_webhook, token_for, TestContext};

fn individual_checkout(name: &str) -> TestRequest {
    let body = json!({
        "cartItems": [
            { "menuItemId": "green-curry", "name": "Green Curry", "quantity": 2 },
            { "menuItemId": "iced-tea", "name": "Thai Iced Tea", "quantity": 1 }
        ],
        "deliveryDetails": { "email": "alice@example.com", "name": "Alice", "addressLine1": "1 Main St", "city": "Springfield" },
        "restaurantId": "thai-garden"
    });
    TestRequest::post()
        .uri("/api/order/checkout/create-checkout-session")
        .insert_header(("Authorization", token_for(name)))
        .set_json(body)
}

#[actix_web::test]
async fn fetch_my_orders_without_a_token() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.call(TestRequest::get().uri("/api/order")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn individual_checkout_and_payment() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.call(individual_checkout("Alice")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["url"], "https://checkout.test/session/cs_test_1");

    // 2 x 13.50 + 3.33, plus 4.00 delivery
    let request = ctx.processor.requests().remove(0);
    assert_eq!(request.delivery_fee, Some(Cents::from(400)));
    assert_eq!(request.total(), Cents::from(3433));
    assert_eq!(request.success_url, "https://food.example.com/order-status?success=true");
    assert_eq!(request.cancel_url, "https://food.example.com/detail/thai-garden?cancelled=true");
    assert!(!request.metadata.is_group_order());
    let order_id = request.metadata.order_id.clone();

    let req = TestRequest::get().uri("/api/order").insert_header(("Authorization", token_for("Alice")));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK);
    let orders = json_body(&body);
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
    assert_eq!(orders[0]["id"], order_id.as_str());
    assert_eq!(orders[0]["status"], "placed");

    let confirmation = PaymentConfirmation {
        event_id: "evt_alice".into(),
        session_id: "cs_test_1".into(),
        metadata: request.metadata,
        payer_email: "alice@example.com".into(),
        amount_total: Cents::from(3433),
    };
    let (status, body) = ctx.call(signed_webhook(&completed_event(&confirmation))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["outcome"], "individual_order_paid");
    let order = ctx.db.fetch_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);

    let req = TestRequest::get().uri(&format!("/api/order/by-id/{order_id}")).insert_header(("Authorization", token_for("Alice")));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["status"], "paid");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn other_peoples_orders_are_not_found() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.call(individual_checkout("Alice")).await;
    assert_eq!(status, StatusCode::OK);
    let order_id: OrderId = ctx.processor.requests()[0].metadata.order_id.clone();

    let req = TestRequest::get().uri(&format!("/api/order/by-id/{order_id}")).insert_header(("Authorization", token_for("Bob")));
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = TestRequest::get().uri("/api/order").insert_header(("Authorization", token_for("Bob")));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!([]));
    ctx.tear_down().await;
}

#[actix_web::test]
async fn failed_sessions_store_no_order() {
    let ctx = TestContext::new().await;
    ctx.processor.fail_with(SessionCreationError::Rejected("amount must be positive".into()));
    let (status, _) = ctx.call(individual_checkout("Alice")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let orders = ctx.db.fetch_orders_for_user(&"alice".into()).await.unwrap();
    assert!(orders.is_empty());
    ctx.tear_down().await;
}
