use crate::{
    db::traits::{CheckoutResult, InsertOrderResult},
    db_types::{NewOrder, Order, OrderId, OrderUpdate, UserId},
};

/// This trait defines the write side of the order lifecycle for backends supporting the marketplace engine.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone {
    type Error: std::error::Error;

    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a new order, and in a single atomic transaction,
    /// * decrements the stock of every product in the order, provided there is enough stock to cover the requested
    ///   quantity. If any product falls short, the transaction is abandoned and `InsufficientStock` is returned.
    /// * stores the order with `Pending` status and `Unpaid` payment status. The total is equal to the subtotal.
    /// * stores a snapshot of every item.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, Self::Error>;

    /// Places every order of a checkout for `buyer_id` in a single atomic transaction. Each order is inserted as
    /// [`insert_order`](Self::insert_order) would, then has its paired `OrderUpdate` applied. Finally the buyer's
    /// cart is emptied.
    ///
    /// If any order falls short on stock, the whole transaction is abandoned: no orders are stored, no stock levels
    /// change and the cart keeps its rows.
    async fn insert_checkout_orders(
        &self,
        buyer_id: UserId,
        orders: Vec<(NewOrder, OrderUpdate)>,
    ) -> Result<CheckoutResult, Self::Error>;

    /// Updates the order details for the given order id. Not all fields are permitted to be updated, so
    /// `OrderUpdate` only exposes those that can be changed.
    ///
    /// Returns the updated order, or `None` if the order does not exist.
    async fn update_order(&self, order_id: OrderId, update: OrderUpdate) -> Result<Option<Order>, Self::Error>;

    /// Permanently removes an order and its items. Returns `false` if there was no such order.
    async fn delete_order(&self, order_id: OrderId) -> Result<bool, Self::Error>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
