use chrono::Duration;
use cucumber::given;
use food_order_engine::{
    db_types::{CartItem, MenuItemId, RestaurantId},
    test_utils::fixtures::{participant, RESTAURANT_ID},
    OrderFlowConfig,
};

use crate::cucumber::{group_order_world::FoodOrderSystem, GroupOrderWorld};

fn config() -> OrderFlowConfig {
    OrderFlowConfig::new("https://food.example.com")
}

#[given("a fresh food ordering system")]
async fn fresh_system(world: &mut GroupOrderWorld) {
    world.system = Some(FoodOrderSystem::new(config()).await);
}

#[given(expr = "a fresh food ordering system where group orders expire after {int} hours")]
async fn fresh_system_with_expiry(world: &mut GroupOrderWorld, hours: i64) {
    let mut config = config();
    config.group_order_ttl = Some(Duration::hours(hours));
    world.system = Some(FoodOrderSystem::new(config).await);
}

#[given(expr = "a fresh food ordering system with groups of {int}")]
async fn fresh_system_with_group_size(world: &mut GroupOrderWorld, size: i64) {
    let mut config = config();
    config.participants_per_group = size;
    world.system = Some(FoodOrderSystem::new(config).await);
}

#[given(expr = "{word} starts a group order with {int} Pad Thai and {int} Spring Rolls")]
async fn start_group_order(world: &mut GroupOrderWorld, name: String, pad_thai: i64, spring_rolls: i64) {
    let mut cart = Vec::new();
    if pad_thai > 0 {
        cart.push(CartItem::new(MenuItemId::from("pad-thai"), "Pad Thai", pad_thai));
    }
    if spring_rolls > 0 {
        cart.push(CartItem::new(MenuItemId::from("spring-rolls"), "Spring Rolls", spring_rolls));
    }
    let sys = world.system();
    let created = sys
        .group_orders
        .create_group_order(&RestaurantId::from(RESTAURANT_ID), &cart, &participant(&name))
        .await
        .expect("Error creating group order");
    sys.current = Some(created.group_order_id);
}
