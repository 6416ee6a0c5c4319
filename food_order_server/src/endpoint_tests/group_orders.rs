use actix_web::{http::StatusCode, test::TestRequest};
use food_order_common::Cents;
use food_order_engine::{
    db_types::{GroupOrderId, GroupOrderStatus},
    traits::SessionCreationError,
};
use serde_json::json;

use super::helpers::{join_request, json_body, token_for, TestContext};

#[actix_web::test]
async fn group_orders_require_a_token() {
    let ctx = TestContext::new().await;
    let req = TestRequest::post().uri("/api/order/group").set_json(json!({ "cartItems": [], "restaurantId": "thai-garden" }));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["error"], "Authentication Error. No bearer token was provided.");

    let req = TestRequest::get().uri("/api/order/get-group").insert_header(("Authorization", "Bearer not.a.token"));
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn create_group_order() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    let record = ctx.group_order(&id).await;
    assert_eq!(record.total_amount, Cents::from(4400));
    assert_eq!(record.amount_per_person, Cents::from(1100));
    assert_eq!(record.total_participants, 4);
    assert_eq!(record.status, GroupOrderStatus::Created);
    assert_eq!(record.initiator_id.as_str(), "alice");

    let req = TestRequest::get().uri(&format!("/api/order/group/{id}")).insert_header(("Authorization", token_for("Bob")));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["shareableLink"], format!("https://food.example.com/join-order/{id}"));
    assert_eq!(body["amountPerPerson"], 1100);
    assert_eq!(body["status"], "created");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn invalid_carts_are_rejected() {
    let ctx = TestContext::new().await;
    let body = json!({
        "cartItems": [{ "menuItemId": "pizza", "name": "Pizza", "quantity": 1 }],
        "restaurantId": "thai-garden"
    });
    let req = TestRequest::post().uri("/api/order/group").insert_header(("Authorization", token_for("Alice"))).set_json(body);
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "cartItems": [], "restaurantId": "thai-garden" });
    let req = TestRequest::post().uri("/api/order/group").insert_header(("Authorization", token_for("Alice"))).set_json(body);
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "cartItems": [{ "menuItemId": "pad-thai", "name": "Pad Thai", "quantity": 1 }], "restaurantId": "nowhere" });
    let req = TestRequest::post().uri("/api/order/group").insert_header(("Authorization", token_for("Alice"))).set_json(body);
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn join_group_order() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    let (status, body) = ctx.call(join_request(&id, "Bob")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["url"], "https://checkout.test/session/cs_test_1");

    let requests = ctx.processor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].total(), Cents::from(1100));
    assert_eq!(requests[0].metadata.group_order_id, Some(id.clone()));
    assert_eq!(requests[0].success_url, "https://food.example.com/group-order-status?success=true");

    let record = ctx.group_order(&id).await;
    assert_eq!(record.status, GroupOrderStatus::InProgress);
    assert_eq!(record.delivery_details.address_line1, "742 Evergreen Terrace");
    assert_eq!(record.paid_count(), 0);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn join_through_the_checkout_session_route() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    let body = json!({
        "deliveryDetails": { "email": "carol@example.com", "name": "Carol", "addressLine1": "1 Main St", "city": "Springfield" },
        "restaurantId": "thai-garden",
        "groupOrderId": id
    });
    let req = TestRequest::post()
        .uri("/api/order/checkout/create-checkout-session")
        .insert_header(("Authorization", token_for("Carol")))
        .set_json(body);
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["url"], "https://checkout.test/session/cs_test_1");
    assert_eq!(ctx.processor.requests()[0].delivery_fee, None);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn participants_cannot_pay_twice() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    let (status, _) = ctx.call(join_request(&id, "Bob")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.pay_share(&id, "Bob").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.call(join_request(&id, "Bob")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "You have already joined and paid for this group order");
    assert_eq!(ctx.processor.request_count(), 1);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn full_group_orders_refuse_joins() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    for name in ["Alice", "Bob", "Carol", "Dave"] {
        let (status, body) = ctx.pay_share(&id, name).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
    assert_eq!(ctx.group_order(&id).await.status, GroupOrderStatus::Paid);

    let (status, body) = ctx.call(join_request(&id, "Erin")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "Group Order is full");
    assert_eq!(ctx.processor.request_count(), 0);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn unknown_group_orders() {
    let ctx = TestContext::new().await;
    let missing = GroupOrderId::from("no-such-group-order");
    let (status, body) = ctx.call(join_request(&missing, "Bob")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["error"], "Group order no-such-group-order not found");

    let req = TestRequest::get().uri("/api/order/group/no-such-group-order").insert_header(("Authorization", token_for("Bob")));
    let (status, _) = ctx.call(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    ctx.tear_down().await;
}

#[actix_web::test]
async fn processor_outages_are_bad_gateways() {
    let ctx = TestContext::new().await;
    let id = ctx.start_group_order("Alice").await;
    ctx.processor.fail_with(SessionCreationError::Unavailable("connection refused".into()));
    let (status, body) = ctx.call(join_request(&id, "Bob")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json_body(&body)["error"].as_str().unwrap().starts_with("Could not create a checkout session."));
    let record = ctx.group_order(&id).await;
    assert_eq!(record.status, GroupOrderStatus::Created);
    assert!(!record.delivery_details.has_address());
    ctx.tear_down().await;
}

#[actix_web::test]
async fn my_group_orders() {
    let ctx = TestContext::new().await;
    let first = ctx.start_group_order("Alice").await;
    let _second = ctx.start_group_order("Carol").await;
    let (status, _) = ctx.pay_share(&first, "Bob").await;
    assert_eq!(status, StatusCode::OK);

    let req = TestRequest::get().uri("/api/order/get-group").insert_header(("Authorization", token_for("Bob")));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    let group_orders = body.as_array().expect("Expected an array");
    assert_eq!(group_orders.len(), 1);
    assert_eq!(group_orders[0]["id"], first.as_str());
    assert_eq!(group_orders[0]["paidParticipants"][0]["email"], "bob@example.com");

    let req = TestRequest::get().uri("/api/order/get-group").insert_header(("Authorization", token_for("Dave")));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
    ctx.tear_down().await;
}

#[actix_web::test]
async fn unreadable_bodies_get_a_json_error() {
    let ctx = TestContext::new().await;
    let req = TestRequest::post()
        .uri("/api/order/group")
        .insert_header(("Authorization", token_for("Alice")))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json");
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_body(&body)["error"].as_str().unwrap().starts_with("Could not read request body:"), "{body}");

    let id = ctx.start_group_order("Alice").await;
    let req = TestRequest::post()
        .uri(&format!("/api/order/join-group/{id}"))
        .insert_header(("Authorization", token_for("Bob")))
        .set_json(json!({ "deliveryDetails": "742 Evergreen Terrace" }));
    let (status, body) = ctx.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_body(&body)["error"].as_str().unwrap().starts_with("Could not read request body:"), "{body}");
    assert_eq!(ctx.processor.request_count(), 0);
    ctx.tear_down().await;
}
