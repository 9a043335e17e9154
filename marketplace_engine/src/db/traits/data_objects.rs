use std::fmt::Display;

use crate::db_types::{Order, OrderStatusType, ProductId, UserId};

/// The outcome of an attempt to persist a new order.
#[derive(Debug, Clone)]
pub enum InsertOrderResult {
    /// The order was saved and stock for every item has been decremented.
    Inserted(Order),
    /// At least one product did not have enough stock. Nothing was saved and no stock levels were changed.
    InsufficientStock(StockShortfall),
}

/// The outcome of an attempt to persist every order of a checkout in one go.
#[derive(Debug, Clone)]
pub enum CheckoutResult {
    /// All the orders were saved, in the order given, and the buyer's cart has been emptied.
    Placed(Vec<Order>),
    /// One of the orders could not be filled. Nothing was saved and the cart is untouched.
    InsufficientStock(StockShortfall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockShortfall {
    pub product_id: ProductId,
    pub product_name: String,
    pub available: i64,
    pub requested: i64,
}

impl Display for StockShortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "insufficient stock for {}, available {}, requested {}",
            self.product_name, self.available, self.requested
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<UserId>,
    pub supplier_id: Option<UserId>,
    pub statuses: Vec<OrderStatusType>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: UserId) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_supplier_id(mut self, supplier_id: UserId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() && self.supplier_id.is_none() && self.statuses.is_empty()
    }
}
