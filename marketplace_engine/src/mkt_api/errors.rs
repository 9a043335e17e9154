use thiserror::Error;

use crate::{db::traits::StockShortfall, db_types::ProductId};

/// Reasons why a set of line items cannot become an order (or a cart row).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("An order must contain at least one item")]
    NoItems,
    #[error("The cart is empty")]
    EmptyCart,
    #[error("All products in an order must come from the same supplier")]
    MixedSuppliers,
    #[error("No supplier could be found for {0}")]
    MissingSupplier(ProductId),
    #[error("{0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Quantity must be at least 1, but was {0}")]
    InvalidQuantity(i64),
    #[error("insufficient stock for {product}, available {available}, requested {requested}")]
    InsufficientStock { product: String, available: i64, requested: i64 },
}

impl From<StockShortfall> for ValidationError {
    fn from(shortfall: StockShortfall) -> Self {
        Self::InsufficientStock {
            product: shortfall.product_name,
            available: shortfall.available,
            requested: shortfall.requested,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order: {0}")]
    ValidationError(#[from] ValidationError),
    #[error("Not authorized: {0}")]
    AuthorizationError(String),
    #[error("Invalid state: {0}")]
    InvalidStateError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
}

impl OrderFlowError {
    pub(crate) fn database<E: std::error::Error>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid cart request: {0}")]
    ValidationError(#[from] ValidationError),
    #[error("Not authorized: {0}")]
    AuthorizationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
}

impl CartApiError {
    pub(crate) fn database<E: std::error::Error>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotificationApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not authorized: {0}")]
    AuthorizationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
}

impl NotificationApiError {
    pub(crate) fn database<E: std::error::Error>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
