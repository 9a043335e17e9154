use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{CartManagement, CatalogManagement},
    db_types::{CartItem, ProductId, UserId},
    mkt_api::{
        cart_objects::Cart,
        errors::{CartApiError, ValidationError},
    },
};

/// Manages the per-user shopping cart. There is at most one row for each (user, product) pair.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CartApi<B>
where B: CartManagement + CatalogManagement
{
    pub async fn cart(&self, user_id: UserId) -> Result<Cart, CartApiError> {
        let items = self.db.fetch_cart_items(user_id).await.map_err(CartApiError::database)?;
        Ok(Cart::new(user_id, items))
    }

    /// Adds `quantity` units of a product to the buyer's cart. A product that is already in the cart has its quantity
    /// increased; the price recorded when it was first added stays.
    pub async fn add(&self, user_id: UserId, product_id: ProductId, quantity: i64) -> Result<CartItem, CartApiError> {
        if quantity < 1 {
            return Err(ValidationError::InvalidQuantity(quantity).into());
        }
        let user = self
            .db
            .fetch_user(user_id)
            .await
            .map_err(CartApiError::database)?
            .ok_or_else(|| CartApiError::NotFoundError(format!("{user_id}")))?;
        if !user.is_buyer() {
            return Err(CartApiError::AuthorizationError(format!("{user_id} is not a buyer and has no cart")));
        }
        let product = self
            .db
            .fetch_product(product_id)
            .await
            .map_err(CartApiError::database)?
            .ok_or(ValidationError::ProductNotFound(product_id))?;
        let item = self.db.add_cart_item(user_id, product_id, quantity, product.price).await.map_err(CartApiError::database)?;
        debug!("🛒️ {user_id} now has {} x {} in their cart", item.quantity, item.product_name);
        Ok(item)
    }

    /// Sets the quantity of a product already in the cart. A quantity of zero or less removes the row, in which case
    /// `None` is returned.
    pub async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError> {
        let not_in_cart = || CartApiError::NotFoundError(format!("{product_id} is not in the cart of {user_id}"));
        if quantity <= 0 {
            if !self.db.remove_cart_item(user_id, product_id).await.map_err(CartApiError::database)? {
                return Err(not_in_cart());
            }
            debug!("🛒️ {product_id} removed from the cart of {user_id}");
            return Ok(None);
        }
        let item = self
            .db
            .set_cart_item_quantity(user_id, product_id, quantity)
            .await
            .map_err(CartApiError::database)?
            .ok_or_else(not_in_cart)?;
        Ok(Some(item))
    }

    /// Returns `true` if the product was in the cart.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<bool, CartApiError> {
        let removed = self.db.remove_cart_item(user_id, product_id).await.map_err(CartApiError::database)?;
        if removed {
            debug!("🛒️ {product_id} removed from the cart of {user_id}");
        }
        Ok(removed)
    }

    /// Empties the cart, returning the number of rows removed.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, CartApiError> {
        self.db.clear_cart(user_id).await.map_err(CartApiError::database)
    }
}
