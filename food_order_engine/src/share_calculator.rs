//! Pricing of carts and per-person shares.
//!
//! Prices always come from the restaurant's menu. Client-supplied names and prices are ignored.
//! The per-person share is `floor(total / participants)`, so the amount collected from a full group is at most
//! `participants - 1` cents short of the order total.
use food_order_common::Cents;
use thiserror::Error;

use crate::db_types::{CartItem, MenuItemId, Restaurant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCartError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Menu item {0} is not on this restaurant's menu")]
    UnknownMenuItem(MenuItemId),
    #[error("Invalid quantity {quantity} for menu item {item}")]
    InvalidQuantity { item: MenuItemId, quantity: i64 },
    #[error("A group order needs at least one participant, not {0}")]
    InvalidParticipantCount(i64),
    #[error("The order total is too large")]
    Overflow,
}

/// A cart line priced from the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub unit_price: Cents,
    pub quantity: i64,
}

impl PricedItem {
    pub fn line_total(&self) -> Cents {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareBreakdown {
    pub items: Vec<PricedItem>,
    pub items_total: Cents,
    pub delivery_fee: Cents,
    /// Item total plus delivery
    pub total_amount: Cents,
    pub participants: i64,
    pub amount_per_person: Cents,
}

impl ShareBreakdown {
    /// The cart as it should be stored, with canonical menu names.
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.items.iter().map(|i| CartItem::new(i.menu_item_id.clone(), i.name.clone(), i.quantity)).collect()
    }

    /// How many cents a full group underpays the order total by. Always in `0..participants`.
    pub fn rounding_shortfall(&self) -> Cents {
        self.total_amount - self.amount_per_person * self.participants
    }
}

/// Prices `cart` against the restaurant's menu and splits the total, including delivery, between `participants`.
pub fn calculate_shares(
    restaurant: &Restaurant,
    cart: &[CartItem],
    participants: i64,
) -> Result<ShareBreakdown, InvalidCartError> {
    if participants < 1 {
        return Err(InvalidCartError::InvalidParticipantCount(participants));
    }
    if cart.is_empty() {
        return Err(InvalidCartError::EmptyCart);
    }
    let mut items = Vec::with_capacity(cart.len());
    let mut items_total = 0i64;
    for line in cart {
        if line.quantity <= 0 {
            return Err(InvalidCartError::InvalidQuantity { item: line.menu_item_id.clone(), quantity: line.quantity });
        }
        let menu_item = restaurant
            .menu_item(&line.menu_item_id)
            .ok_or_else(|| InvalidCartError::UnknownMenuItem(line.menu_item_id.clone()))?;
        let line_total = menu_item.price.value().checked_mul(line.quantity).ok_or(InvalidCartError::Overflow)?;
        items_total = items_total.checked_add(line_total).ok_or(InvalidCartError::Overflow)?;
        items.push(PricedItem {
            menu_item_id: menu_item.id.clone(),
            name: menu_item.name.clone(),
            unit_price: menu_item.price,
            quantity: line.quantity,
        });
    }
    let delivery_fee = restaurant.delivery_price;
    let total = items_total.checked_add(delivery_fee.value()).ok_or(InvalidCartError::Overflow)?;
    let total_amount = Cents::from(total);
    let amount_per_person =
        total_amount.split_floor(participants).ok_or(InvalidCartError::InvalidParticipantCount(participants))?;
    Ok(ShareBreakdown {
        items,
        items_total: Cents::from(items_total),
        delivery_fee,
        total_amount,
        participants,
        amount_per_person,
    })
}
