use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewProduct, NewUser, Product, ProductId, User, UserId},
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (username, email, role, company_name) VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, role, company_name, created_at;
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(user.role)
    .bind(&user.company_name)
    .fetch_one(conn)
    .await;
    match result {
        Ok(user) => {
            debug!("🗃️ New {} account created: {} ({})", user.role, user.username, user.id);
            Ok(user)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(SqliteDatabaseError::UserCreationError(format!("Username {} is already taken", user.username)))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<User>, SqliteDatabaseError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, role, company_name, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

pub async fn insert_product(
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, SqliteDatabaseError> {
    let product = sqlx::query_as::<_, Product>(
        r#"
            INSERT INTO products (supplier_id, name, price, stock_quantity) VALUES ($1, $2, $3, $4)
            RETURNING id, supplier_id, name, price, stock_quantity, average_rating, review_count, created_at;
        "#,
    )
    .bind(product.supplier_id)
    .bind(&product.name)
    .bind(product.price.to_plain_string())
    .bind(product.stock_quantity)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product {} '{}' added for {}", product.id, product.name, product.supplier_id);
    Ok(product)
}

pub async fn fetch_product(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, SqliteDatabaseError> {
    let product = sqlx::query_as::<_, Product>(
        r#"
            SELECT id, supplier_id, name, price, stock_quantity, average_rating, review_count, created_at
            FROM products
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_products_for_supplier(
    supplier_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, SqliteDatabaseError> {
    let products = sqlx::query_as::<_, Product>(
        r#"
            SELECT id, supplier_id, name, price, stock_quantity, average_rating, review_count, created_at
            FROM products
            WHERE supplier_id = $1
            ORDER BY id ASC
        "#,
    )
    .bind(supplier_id)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} products found for {supplier_id}", products.len());
    Ok(products)
}

pub async fn update_product_rating(
    id: ProductId,
    average_rating: f64,
    review_count: i64,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE products SET average_rating = $1, review_count = $2 WHERE id = $3")
        .bind(average_rating)
        .bind(review_count)
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::ProductNotFound(id.value()));
    }
    trace!("🗃️ Rating for {id} set to {average_rating:.2} over {review_count} reviews");
    Ok(())
}

/// Decrements the product's stock by `quantity`, but only if at least that much stock is available.
///
/// Returns `false` (and leaves the stock untouched) if there is not enough stock.
pub async fn decrement_stock(
    id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity - $1 WHERE id = $2 AND stock_quantity >= $1",
    )
    .bind(quantity)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
