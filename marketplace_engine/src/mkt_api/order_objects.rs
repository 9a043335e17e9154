use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, PaymentMethod, ShippingAddress, ShippingMethod};

/// The buyer's choices at checkout. They are applied to every order the cart is split into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: Option<PaymentMethod>,
    pub shipping_method: ShippingMethod,
    pub shipping_address: Option<ShippingAddress>,
}

impl CheckoutRequest {
    pub fn new(payment_method: PaymentMethod, shipping_method: ShippingMethod) -> Self {
        Self { payment_method: Some(payment_method), shipping_method, shipping_address: None }
    }

    pub fn with_address(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = Some(address);
        self
    }
}

/// Days-to-arrive strings quoted in shipping notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEstimates {
    /// Quoted when an order is confirmed.
    pub shipping: String,
    /// Quoted when an order ships.
    pub delivery: String,
}

impl Default for DeliveryEstimates {
    fn default() -> Self {
        Self { shipping: "2-3 business days".to_string(), delivery: "3-5 business days".to_string() }
    }
}

/// The 1-based position of `order_id` among `orders` once they are sorted by creation time (oldest first, ties broken
/// by id). This is the "Order #n" a viewer sees, and it is recomputed from scratch every time.
pub fn display_index(orders: &[Order], order_id: OrderId) -> Option<usize> {
    let mut keys = orders.iter().map(|o| (o.created_at, o.id)).collect::<Vec<_>>();
    keys.sort();
    keys.iter().position(|(_, id)| *id == order_id).map(|i| i + 1)
}
