use crate::{
    db::traits::OrderQueryFilter,
    db_types::{Order, OrderId},
};

/// The `OrderManagement` trait defines the behaviour for querying information about orders in the database backend.
///
/// Orders are always returned with their items populated.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    type Error: std::error::Error;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, Self::Error>;

    /// Fetches orders according to the criteria in `query`, ordered by creation time, oldest first.
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, Self::Error>;
}
