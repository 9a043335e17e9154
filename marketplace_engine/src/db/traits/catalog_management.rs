use crate::db_types::{NewProduct, NewUser, Product, ProductId, User, UserId};

/// Users and products. Product edits other than rating maintenance happen outside the engine.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    type Error: std::error::Error;

    async fn insert_user(&self, user: NewUser) -> Result<User, Self::Error>;

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, Self::Error>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, Self::Error>;

    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, Self::Error>;

    /// All the supplier's products, in catalog (id) order.
    async fn fetch_products_for_supplier(&self, supplier_id: UserId) -> Result<Vec<Product>, Self::Error>;

    /// Stores the derived review statistics for a product.
    async fn update_product_rating(
        &self,
        product_id: ProductId,
        average_rating: f64,
        review_count: i64,
    ) -> Result<(), Self::Error>;
}
