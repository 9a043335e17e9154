//! SQLite backend for the marketplace engine.
//!
//! Each submodule holds the queries for one table family. The functions take a `&mut SqliteConnection`, so that
//! [`SqliteDatabase`] can compose them inside a transaction when atomicity is required.
mod db;
mod errors;

pub mod carts;
pub mod catalog;
pub mod notifications;
pub mod orders;

pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = url.parse::<SqliteConnectOptions>()?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
