//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{carts, catalog, new_pool, notifications, orders, SqliteDatabaseError};
use crate::{
    config::MarketplaceConfig,
    db::traits::{
        CartManagement,
        CatalogManagement,
        CheckoutResult,
        InsertOrderResult,
        NotificationManagement,
        OrderFlowDatabase,
        OrderManagement,
        OrderQueryFilter,
    },
    db_types::{
        CartItem,
        Money,
        NewNotification,
        NewOrder,
        NewProduct,
        NewUser,
        Notification,
        NotificationId,
        Order,
        OrderId,
        OrderUpdate,
        Product,
        ProductId,
        User,
        UserId,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderFlowDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let result = orders::insert_order(order, &mut tx).await?;
        match &result {
            InsertOrderResult::Inserted(order) => {
                tx.commit().await?;
                debug!("🗃️ Order {} has been saved in the DB for {}", order.id, order.buyer_id);
            },
            InsertOrderResult::InsufficientStock(shortfall) => {
                tx.rollback().await?;
                debug!("🗃️ Order was not saved: {shortfall}");
            },
        }
        Ok(result)
    }

    async fn insert_checkout_orders(
        &self,
        buyer_id: UserId,
        batch: Vec<(NewOrder, OrderUpdate)>,
    ) -> Result<CheckoutResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let mut placed = Vec::with_capacity(batch.len());
        for (order, update) in batch {
            let order = match orders::insert_order(order, &mut tx).await? {
                InsertOrderResult::Inserted(order) => order,
                InsertOrderResult::InsufficientStock(shortfall) => {
                    tx.rollback().await?;
                    debug!("🗃️ Checkout for {buyer_id} was not saved: {shortfall}");
                    return Ok(CheckoutResult::InsufficientStock(shortfall));
                },
            };
            orders::update_order(order.id, update, &mut tx).await?;
            let order = orders::fetch_order(order.id, &mut tx).await?.ok_or_else(|| {
                SqliteDatabaseError::QueryError(format!("Order {} was inserted, but could not be read back", order.id))
            })?;
            placed.push(order);
        }
        let cleared = carts::clear(buyer_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {} checkout orders saved for {buyer_id}. {cleared} cart rows removed", placed.len());
        Ok(CheckoutResult::Placed(placed))
    }

    async fn update_order(&self, order_id: OrderId, update: OrderUpdate) -> Result<Option<Order>, Self::Error> {
        let mut tx = self.pool.begin().await?;
        orders::update_order(order_id, update, &mut tx).await?;
        let order = orders::fetch_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let deleted = orders::delete_order(order_id, &mut conn).await?;
        if deleted {
            debug!("🗃️ Order {order_id} has been deleted");
        }
        Ok(deleted)
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(query, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_user(&self, user: NewUser) -> Result<User, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let user = catalog::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_user(user_id, &mut conn).await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let product = catalog::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_product(product_id, &mut conn).await
    }

    async fn fetch_products_for_supplier(&self, supplier_id: UserId) -> Result<Vec<Product>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_products_for_supplier(supplier_id, &mut conn).await
    }

    async fn update_product_rating(
        &self,
        product_id: ProductId,
        average_rating: f64,
        review_count: i64,
    ) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::update_product_rating(product_id, average_rating, review_count, &mut conn).await
    }
}

impl CartManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        carts::fetch_cart_items(user_id, &mut conn).await
    }

    async fn add_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
        unit_price: Money,
    ) -> Result<CartItem, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let item = carts::upsert_cart_item(user_id, product_id, quantity, unit_price, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn set_cart_item_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let item = carts::set_quantity(user_id, product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn remove_cart_item(&self, user_id: UserId, product_id: ProductId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        carts::remove_item(user_id, product_id, &mut conn).await
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<u64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        carts::clear(user_id, &mut conn).await
    }
}

impl NotificationManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let notification = notifications::insert_notification(notification, &mut tx).await?;
        tx.commit().await?;
        Ok(notification)
    }

    async fn fetch_notification(&self, id: NotificationId) -> Result<Option<Notification>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::fetch_notification(id, &mut conn).await
    }

    async fn fetch_notifications_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::fetch_for_user(user_id, unread_only, &mut conn).await
    }

    async fn count_unread_notifications(&self, user_id: UserId) -> Result<i64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::count_unread(user_id, &mut conn).await
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_read(id, &mut conn).await
    }

    async fn mark_all_notifications_read(&self, user_id: UserId) -> Result<u64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_all_read(user_id, &mut conn).await
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::delete(id, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the database URL and pool size from the configuration.
    pub async fn from_config(config: &MarketplaceConfig) -> Result<Self, SqliteDatabaseError> {
        info!("🗃️ Using database URL: {}", config.database_url);
        SqliteDatabase::new_with_url(config.database_url.as_str(), config.db_max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date by running any outstanding embedded migrations.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
