use std::collections::HashMap;

use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::{
        sqlite::{catalog, SqliteDatabaseError},
        traits::{InsertOrderResult, OrderQueryFilter, StockShortfall},
    },
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderUpdate, ProductId},
};

const ORDER_COLUMNS: &str = r#"
    id, buyer_id, supplier_id, status, payment_status, subtotal, shipping_cost, total, shipping_method,
    payment_method, shipping_address, shipping_city, shipping_province, shipping_postal_code, shipping_phone,
    tracking_number, courier_name, created_at, updated_at
"#;

/// Decrements stock for every item and inserts the order and its items using the given connection. This is not
/// atomic on its own. Run it inside a transaction and pass `&mut tx` as the connection argument, then roll back if
/// `InsufficientStock` is returned.
///
/// Lines for the same product are checked against the stock as one combined quantity.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, SqliteDatabaseError> {
    for (product_id, product_name, quantity) in quantities_per_product(&order) {
        if !catalog::decrement_stock(product_id, quantity, conn).await? {
            let available = catalog::fetch_product(product_id, conn)
                .await?
                .map(|p| p.stock_quantity)
                .ok_or(SqliteDatabaseError::ProductNotFound(product_id.value()))?;
            debug!("🗃️ Not enough stock for {product_name} ({product_id}). {available} available, {quantity} requested");
            return Ok(InsertOrderResult::InsufficientStock(StockShortfall {
                product_id,
                product_name: product_name.to_string(),
                available,
                requested: quantity,
            }));
        }
    }
    let subtotal = order.subtotal().to_plain_string();
    let id: OrderId = sqlx::query_scalar(
        r#"
            INSERT INTO orders (buyer_id, supplier_id, subtotal, total, created_at, updated_at)
            VALUES ($1, $2, $3, $3, $4, $4)
            RETURNING id;
        "#,
    )
    .bind(order.buyer_id)
    .bind(order.supplier_id)
    .bind(subtotal)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;
    for item in &order.items {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price.to_plain_string())
        .execute(&mut *conn)
        .await?;
    }
    trace!("🗃️ Order {id} and {} items inserted", order.items.len());
    let order = fetch_order(id, conn).await?.ok_or_else(|| {
        SqliteDatabaseError::QueryError(format!("Order {id} was inserted, but could not be read back"))
    })?;
    Ok(InsertOrderResult::Inserted(order))
}

/// The total quantity ordered of each product, in the order the products first appear.
fn quantities_per_product(order: &NewOrder) -> Vec<(ProductId, &str, i64)> {
    let mut totals: Vec<(ProductId, &str, i64)> = Vec::with_capacity(order.items.len());
    for item in &order.items {
        match totals.iter_mut().find(|(id, _, _)| *id == item.product_id) {
            Some((_, _, quantity)) => *quantity += item.quantity,
            None => totals.push((item.product_id, item.product_name.as_str(), item.quantity)),
        }
    }
    totals
}

/// Fetches the order with the given id, along with its items.
pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(&mut *conn).await?;
    match order {
        Some(mut order) => {
            order.items = fetch_order_items(id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

pub async fn fetch_order_items(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, SqliteDatabaseError> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order, with ties broken by id.
pub async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(supplier_id) = query.supplier_id {
        where_clause.push("supplier_id = ");
        where_clause.push_bind_unseparated(supplier_id);
    }
    if !query.statuses.is_empty() {
        where_clause.push("status IN (");
        let mut statuses = where_clause;
        for (i, status) in query.statuses.iter().enumerate() {
            if i > 0 {
                statuses.push_unseparated(", ");
            }
            statuses.push_bind_unseparated(status.to_string());
        }
        statuses.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let mut orders = builder.build_query_as::<Order>().fetch_all(&mut *conn).await?;
    trace!("🗃️ Result of fetch_orders: {}", orders.len());
    attach_items(&mut orders, conn).await?;
    Ok(orders)
}

/// Loads the items for all the given orders in a single query.
async fn attach_items(orders: &mut [Order], conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    if orders.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, order_id, product_id, product_name, quantity, unit_price FROM order_items WHERE order_id IN (",
    );
    let mut ids = builder.separated(", ");
    for order in orders.iter() {
        ids.push_bind(order.id);
    }
    builder.push(") ORDER BY id ASC");
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    for order in orders.iter_mut() {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(())
}

/// Applies the update and returns the number of rows changed (0 or 1).
pub(crate) async fn update_order(
    id: OrderId,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for order {id}. Update request skipped.");
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(", ");
    let mut set_clause = builder.separated(", ");
    if let Some(status) = update.status {
        set_clause.push("status = ");
        set_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(payment_status) = update.payment_status {
        set_clause.push("payment_status = ");
        set_clause.push_bind_unseparated(payment_status.to_string());
    }
    if let Some(payment_method) = update.payment_method {
        set_clause.push("payment_method = ");
        set_clause.push_bind_unseparated(payment_method.to_string());
    }
    if let Some(shipping_method) = update.shipping_method {
        set_clause.push("shipping_method = ");
        set_clause.push_bind_unseparated(shipping_method.to_string());
    }
    if let Some(shipping_cost) = update.shipping_cost {
        set_clause.push("shipping_cost = ");
        set_clause.push_bind_unseparated(shipping_cost.to_plain_string());
    }
    if let Some(total) = update.total {
        set_clause.push("total = ");
        set_clause.push_bind_unseparated(total.to_plain_string());
    }
    if let Some(address) = update.shipping_address {
        set_clause.push("shipping_address = ");
        set_clause.push_bind_unseparated(address.address);
        set_clause.push("shipping_city = ");
        set_clause.push_bind_unseparated(address.city);
        set_clause.push("shipping_province = ");
        set_clause.push_bind_unseparated(address.province);
        set_clause.push("shipping_postal_code = ");
        set_clause.push_bind_unseparated(address.postal_code);
        set_clause.push("shipping_phone = ");
        set_clause.push_bind_unseparated(address.phone);
    }
    if let Some(tracking_number) = update.tracking_number {
        set_clause.push("tracking_number = ");
        set_clause.push_bind_unseparated(tracking_number);
    }
    if let Some(courier_name) = update.courier_name {
        set_clause.push("courier_name = ");
        set_clause.push_bind_unseparated(courier_name);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    trace!("🗃️ Executing query: {}", builder.sql());
    let res = builder.build().execute(conn).await?;
    trace!("🗃️ Result of update_order: {res:?}");
    Ok(res.rows_affected())
}

/// Deletes the order. Its items are removed by the cascading foreign key.
pub(crate) async fn delete_order(id: OrderId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(conn).await?;
    Ok(res.rows_affected() > 0)
}
