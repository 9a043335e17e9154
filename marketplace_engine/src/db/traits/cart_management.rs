use crate::db_types::{CartItem, Money, ProductId, UserId};

#[allow(async_fn_in_trait)]
pub trait CartManagement {
    type Error: std::error::Error;

    /// The user's cart rows, in the order they were first added.
    async fn fetch_cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, Self::Error>;

    /// Adds `quantity` units of the product to the user's cart. If the product is already in the cart, the quantity is
    /// added to the existing row and the original unit price is kept. Otherwise a new row is created with
    /// `unit_price`.
    async fn add_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
        unit_price: Money,
    ) -> Result<CartItem, Self::Error>;

    /// Sets the quantity of an existing row. Returns `None` if the product is not in the user's cart.
    async fn set_cart_item_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, Self::Error>;

    /// Returns `true` if a row was removed.
    async fn remove_cart_item(&self, user_id: UserId, product_id: ProductId) -> Result<bool, Self::Error>;

    /// Removes all the user's rows, returning how many were removed.
    async fn clear_cart(&self, user_id: UserId) -> Result<u64, Self::Error>;
}
