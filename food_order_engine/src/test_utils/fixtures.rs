use food_order_common::Cents;

use crate::{
    db_types::{CartItem, DeliveryDetails, GroupOrder, MenuItem, MenuItemId, Participant, Restaurant, RestaurantId},
    order_objects::PaymentConfirmation,
    test_utils::prepare_env::prepare_test_env,
    traits::CorrelationMetadata,
    SqliteDatabase,
};

pub const RESTAURANT_ID: &str = "thai-garden";

/// Delivery costs $4.00
pub fn thai_garden() -> Restaurant {
    let item = |id: &str, name: &str, price: i64| MenuItem {
        id: MenuItemId::from(id),
        name: name.to_string(),
        price: Cents::from(price),
    };
    Restaurant {
        id: RestaurantId::from(RESTAURANT_ID),
        name: "Thai Garden".to_string(),
        city: "Springfield".to_string(),
        country: "USA".to_string(),
        delivery_price: Cents::from(400),
        menu_items: vec![
            item("pad-thai", "Pad Thai", 1500),
            item("spring-rolls", "Spring Rolls", 500),
            item("green-curry", "Green Curry", 1350),
            item("iced-tea", "Thai Iced Tea", 333),
        ],
    }
}

/// Two Pad Thai and two Spring Rolls: $40.00 of food, $44.00 with delivery.
pub fn forty_dollar_cart() -> Vec<CartItem> {
    vec![
        CartItem::new(MenuItemId::from("pad-thai"), "Pad Thai", 2),
        CartItem::new(MenuItemId::from("spring-rolls"), "Spring Rolls", 2),
    ]
}

pub fn participant(name: &str) -> Participant {
    let id = name.to_lowercase();
    Participant::new(id.clone(), format!("{id}@example.com")).with_name(name)
}

pub fn delivery_for(participant: &Participant) -> DeliveryDetails {
    DeliveryDetails::new(
        participant.email.clone(),
        participant.name.clone().unwrap_or_default(),
        "742 Evergreen Terrace".to_string(),
        "Springfield".to_string(),
    )
}

/// A confirmation as the processor would send it after `payer` paid their share of `group_order`.
pub fn share_confirmation(group_order: &GroupOrder, payer: &Participant) -> PaymentConfirmation {
    PaymentConfirmation {
        event_id: format!("evt_{}_{}", group_order.id, payer.id),
        session_id: format!("cs_{}_{}", group_order.id, payer.id),
        metadata: CorrelationMetadata {
            order_id: group_order.id.as_str().into(),
            restaurant_id: group_order.restaurant_id.clone(),
            user_id: payer.id.clone(),
            payer_name: payer.name.clone().unwrap_or_default(),
            group_order_id: Some(group_order.id.clone()),
        },
        payer_email: payer.email.clone(),
        amount_total: group_order.amount_per_person,
    }
}

/// A fresh database with the Thai Garden restaurant in its catalog.
pub async fn seeded_database(url: &str) -> SqliteDatabase {
    prepare_test_env(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.insert_restaurant(&thai_garden()).await.expect("Error seeding the catalog");
    db
}
