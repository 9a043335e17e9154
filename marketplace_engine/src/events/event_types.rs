use serde::{Deserialize, Serialize};

use crate::db_types::{Order, User};

/// Published once an order has been persisted and its stock decremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub buyer: User,
    pub supplier: User,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, buyer: User, supplier: User) -> Self {
        Self { order, buyer, supplier }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmedEvent {
    pub order: Order,
    pub buyer: User,
    pub estimated_shipping: String,
}

impl OrderConfirmedEvent {
    pub fn new<S: Into<String>>(order: Order, buyer: User, estimated_shipping: S) -> Self {
        Self { order, buyer, estimated_shipping: estimated_shipping.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShippedEvent {
    pub order: Order,
    pub buyer: User,
    /// The courier's tracking number, or "TBA" if the supplier has not provided one.
    pub tracking_number: String,
    pub estimated_delivery: String,
}

impl OrderShippedEvent {
    pub const NO_TRACKING_NUMBER: &'static str = "TBA";

    pub fn new<S: Into<String>>(order: Order, buyer: User, estimated_delivery: S) -> Self {
        let tracking_number = order
            .tracking_number
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| Self::NO_TRACKING_NUMBER.to_string());
        Self { order, buyer, tracking_number, estimated_delivery: estimated_delivery.into() }
    }
}

/// The buyer has declared that they paid for the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub order: Order,
    pub buyer: User,
    pub supplier: User,
}

impl PaymentConfirmedEvent {
    pub fn new(order: Order, buyer: User, supplier: User) -> Self {
        Self { order, buyer, supplier }
    }
}

/// The supplier has marked the order's payment as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApprovedEvent {
    pub order: Order,
    pub buyer: User,
}

impl PaymentApprovedEvent {
    pub fn new(order: Order, buyer: User) -> Self {
        Self { order, buyer }
    }
}
