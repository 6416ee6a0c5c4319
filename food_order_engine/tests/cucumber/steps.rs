use std::str::FromStr;

use chrono::{Duration, Utc};
use cucumber::{then, when};
use food_order_common::Cents;
use food_order_engine::{
    db_types::GroupOrderStatus,
    test_utils::fixtures::{delivery_for, participant, share_confirmation},
    traits::{OrderManagement, SessionCreationError},
};

use crate::cucumber::GroupOrderWorld;

#[when(expr = "{word} joins the group order")]
async fn join(world: &mut GroupOrderWorld, name: String) {
    try_join(world, &name).await;
}

async fn try_join(world: &mut GroupOrderWorld, name: &str) {
    let sys = world.system();
    let payer = participant(name);
    let id = sys.current_id();
    let result = sys.group_orders.prepare_join(&id, delivery_for(&payer), &payer).await;
    sys.last_error = result.err();
}

#[when(expr = "{word} pays their share")]
async fn pay(world: &mut GroupOrderWorld, name: String) {
    process_share_payment(world, &name).await;
}

async fn process_share_payment(world: &mut GroupOrderWorld, name: &str) {
    let sys = world.system();
    let record = sys.current_group_order().await;
    let outcome = sys
        .callbacks
        .process_checkout_completed(share_confirmation(&record, &participant(name)))
        .await
        .expect("Error processing payment");
    sys.last_outcome = Some(outcome);
}

#[when(expr = "{word} joins and pays their share")]
async fn join_and_pay(world: &mut GroupOrderWorld, name: String) {
    try_join(world, &name).await;
    assert!(world.system().last_error.is_none(), "{name} could not join the group order");
    process_share_payment(world, &name).await;
}

#[when("the payment processor is unavailable")]
async fn processor_down(world: &mut GroupOrderWorld) {
    world.system().processor.fail_with(SessionCreationError::Unavailable("connection refused".into()));
}

#[when("the payment processor recovers")]
async fn processor_up(world: &mut GroupOrderWorld) {
    world.system().processor.recover();
}

#[when(expr = "the expiry sweep runs {int} hours from now")]
async fn sweep(world: &mut GroupOrderWorld, hours: i64) {
    let sys = world.system();
    let _ = sys.group_orders.expire_stale_group_orders(Utc::now() + Duration::hours(hours)).await.expect("Sweep failed");
}

#[then(expr = "each share costs {int} cents")]
async fn share_costs(world: &mut GroupOrderWorld, cents: i64) {
    let record = world.system().current_group_order().await;
    assert_eq!(record.amount_per_person, Cents::from(cents));
}

#[then(expr = "the group order total is {int} cents")]
async fn group_total(world: &mut GroupOrderWorld, cents: i64) {
    let record = world.system().current_group_order().await;
    assert_eq!(record.total_amount, Cents::from(cents));
}

#[then(expr = "the group order is {word}")]
async fn group_status(world: &mut GroupOrderWorld, status: String) {
    let expected = GroupOrderStatus::from_str(&status).expect("Not a valid status");
    let record = world.system().current_group_order().await;
    assert_eq!(record.status, expected);
}

#[then(expr = "{int} shares have been paid")]
async fn shares_paid(world: &mut GroupOrderWorld, count: i64) {
    let record = world.system().current_group_order().await;
    assert_eq!(record.paid_count(), count);
}

#[then(expr = "the join is refused with {string}")]
async fn join_refused(world: &mut GroupOrderWorld, message: String) {
    let err = world.system().last_error.take().expect("The join was not refused");
    assert_eq!(err.to_string(), message);
}

#[then(expr = "the join is refused because the payment processor is down")]
async fn join_refused_upstream(world: &mut GroupOrderWorld) {
    let err = world.system().last_error.take().expect("The join was not refused");
    assert!(err.to_string().starts_with("Could not create a checkout session"), "{err}");
}

#[then(expr = "the last payment was handled as {word}")]
async fn last_outcome(world: &mut GroupOrderWorld, label: String) {
    let outcome = world.system().last_outcome.take().expect("No payment has been processed");
    assert_eq!(outcome.label(), label);
}

#[then(expr = "the delivery is addressed to {string}")]
async fn delivery_names(world: &mut GroupOrderWorld, names: String) {
    let record = world.system().current_group_order().await;
    assert_eq!(record.delivery_details.name, names);
}

#[then(expr = "{word} has a final order for {int} cents")]
async fn final_order(world: &mut GroupOrderWorld, name: String, cents: i64) {
    let sys = world.system();
    let id = sys.current_id();
    let orders = sys.db.fetch_orders_for_user(&participant(&name).id).await.expect("Error fetching orders");
    let finals = orders.iter().filter(|o| o.kind.group_order_id() == Some(&id)).collect::<Vec<_>>();
    assert_eq!(finals.len(), 1, "Expected exactly one final order");
    assert_eq!(finals[0].total_amount, Cents::from(cents));
}

#[then(expr = "{word} has no orders")]
async fn no_orders(world: &mut GroupOrderWorld, name: String) {
    let sys = world.system();
    let orders = sys.db.fetch_orders_for_user(&participant(&name).id).await.expect("Error fetching orders");
    assert!(orders.is_empty());
}
