use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{CartItem, Money, ProductId, UserId},
};

const CART_ITEM_QUERY: &str = r#"
    SELECT
        cart_items.id,
        cart_items.user_id,
        cart_items.product_id,
        products.name AS product_name,
        products.supplier_id,
        cart_items.quantity,
        cart_items.unit_price,
        cart_items.created_at
    FROM cart_items JOIN products ON products.id = cart_items.product_id
"#;

pub async fn fetch_cart_items(user_id: UserId, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, SqliteDatabaseError> {
    let sql = format!("{CART_ITEM_QUERY} WHERE cart_items.user_id = $1 ORDER BY cart_items.id ASC");
    let items = sqlx::query_as::<_, CartItem>(&sql).bind(user_id).fetch_all(conn).await?;
    trace!("🗃️ {user_id} has {} rows in their cart", items.len());
    Ok(items)
}

pub async fn fetch_cart_item(
    user_id: UserId,
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, SqliteDatabaseError> {
    let sql = format!("{CART_ITEM_QUERY} WHERE cart_items.user_id = $1 AND cart_items.product_id = $2");
    let item = sqlx::query_as::<_, CartItem>(&sql).bind(user_id).bind(product_id).fetch_optional(conn).await?;
    Ok(item)
}

/// Inserts a new row, or adds to the quantity of the existing (user, product) row. The unit price of an existing row
/// is left as it is.
pub async fn upsert_cart_item(
    user_id: UserId,
    product_id: ProductId,
    quantity: i64,
    unit_price: Money,
    conn: &mut SqliteConnection,
) -> Result<CartItem, SqliteDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (user_id, product_id, quantity, unit_price, created_at) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price.to_plain_string())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    debug!("🗃️ Added {quantity} x {product_id} to the cart of {user_id}");
    fetch_cart_item(user_id, product_id, conn).await?.ok_or_else(|| {
        SqliteDatabaseError::QueryError(format!("Cart row for {user_id} and {product_id} could not be read back"))
    })
}

pub async fn set_quantity(
    user_id: UserId,
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE cart_items SET quantity = $1 WHERE user_id = $2 AND product_id = $3")
        .bind(quantity)
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch_cart_item(user_id, product_id, conn).await
}

pub async fn remove_item(
    user_id: UserId,
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear(user_id: UserId, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(conn).await?;
    debug!("🗃️ Cleared {} rows from the cart of {user_id}", result.rows_affected());
    Ok(result.rows_affected())
}
