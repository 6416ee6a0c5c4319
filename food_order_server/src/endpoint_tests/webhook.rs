use actix_web::{http::StatusCode, test::TestRequest};
use checkout_tools::webhook::{sign_payload, SIGNATURE_HEADER};
use chrono::Utc;
use food_order_engine::{
    db_types::{GroupOrderId, GroupOrderStatus},
    test_utils::fixtures::{participant, share_confirmation},
    traits::OrderManagement,
};
use serde_json::json;

use super::helpers::{completed_event, json_body, signed_webhook, TestContext, WEBHOOK_SECRET};

fn webhook_request(payload: &str, signature: Option<String>) -> TestRequest {
    let mut req = TestRequest::post()
        .uri("/api/order/checkout/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload.to_string());
    if let Some(sig) = signature {
        req = req.insert_header((SIGNATURE_HEADER, sig));
    }
    req
}

#[actix_web::test]
async fn unsigned_events_are_rejected() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    let record = ctx.group_order(&id).await;
    let payload = completed_event(&share_confirmation(&record, &participant("Bob"))).to_string();

    let (status, _) = ctx.call(webhook_request(&payload, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let forged = sign_payload(payload.as_bytes(), "whsec_someone_else", Utc::now().timestamp());
    let (status, _) = ctx.call(webhook_request(&payload, Some(forged))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = sign_payload(payload.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp() - 3600);
    let (status, _) = ctx.call(webhook_request(&payload, Some(stale))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let after = ctx.group_order(&id).await;
    assert_eq!(after.paid_count(), 0);
    assert_eq!(after.version, record.version);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn signed_events_record_payments() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    let (status, body) = ctx.pay_share(&id, "Bob").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["outcome"], "participant_recorded");
    let record = ctx.group_order(&id).await;
    assert_eq!(record.paid_count(), 1);
    assert_eq!(record.status, GroupOrderStatus::InProgress);
    assert_eq!(record.delivery_details.name, "Bob");

    // Redelivery of the same event
    let (status, body) = ctx.pay_share(&id, "Bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["outcome"], "duplicate");
    assert_eq!(ctx.group_order(&id).await.paid_count(), 1);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn last_share_creates_the_final_order() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    for name in ["Alice", "Bob", "Carol"] {
        let (_, body) = ctx.pay_share(&id, name).await;
        assert_eq!(json_body(&body)["outcome"], "participant_recorded");
    }
    let (status, body) = ctx.pay_share(&id, "Dave").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["outcome"], "group_order_completed");

    let record = ctx.group_order(&id).await;
    assert_eq!(record.status, GroupOrderStatus::Paid);
    assert_eq!(record.delivery_details.name, "Alice, Bob, Carol, Dave");
    let orders = ctx.db.fetch_orders_for_user(&participant("Alice").id).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].kind.group_order_id(), Some(&id));

    // A straggler's payment is acknowledged, but not recorded
    let (status, body) = ctx.pay_share(&id, "Erin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["outcome"], "closed_group_order");
    assert_eq!(ctx.group_order(&id).await.paid_count(), 4);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn events_we_do_not_act_on_are_acknowledged() {
    let ctx = TestContext::new().await;
    let event = json!({ "id": "evt_2", "type": "checkout.session.expired", "data": { "object": { "id": "cs_2" } } });
    let (status, body) = ctx.call(signed_webhook(&event)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["success"], true);

    let id = ctx.start_group_order("Alice").await;
    let mut record = ctx.group_order(&id).await;
    record.id = GroupOrderId::from("deleted-group-order");
    let event = completed_event(&share_confirmation(&record, &participant("Bob")));
    let (status, body) = ctx.call(signed_webhook(&event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["outcome"], "unknown_record");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn malformed_events_are_rejected() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.call(signed_webhook(&json!({ "hello": "world" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let event = json!({
        "id": "evt_3",
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_3", "amount_total": 1100, "metadata": {} } }
    });
    let (status, body) = ctx.call(signed_webhook(&event)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_body(&body)["error"].as_str().unwrap().starts_with("Invalid webhook event."));
    ctx.tear_down().await;
}
