use log::*;
use marketplace_engine::{
    db_types::{Money, NewProduct, NewUser, Product, User},
    CatalogManagement,
    MarketplaceConfig,
    OrderFlowDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// A migrated database with two buyers, two suppliers and a small catalog.
pub struct Marketplace {
    pub db: SqliteDatabase,
    pub siti: User,
    pub budi: User,
    pub batik_house: User,
    pub kopi_jawa: User,
    /// 150,000, 10 in stock. Sold by `batik_house`.
    pub batik_shirt: Product,
    /// 85,000, 3 in stock. Sold by `batik_house`.
    pub silk_scarf: Product,
    /// 120,000, 20 in stock. Sold by `kopi_jawa`.
    pub arabica_beans: Product,
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/mkt_test_store_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let config = MarketplaceConfig { database_url: url.to_string(), ..MarketplaceConfig::default() };
    let db = SqliteDatabase::from_config(&config).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("🚀️ Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

pub async fn seed_marketplace() -> Marketplace {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let siti = db.insert_user(NewUser::buyer("siti", "siti@example.com")).await.expect("Error creating buyer");
    let budi = db.insert_user(NewUser::buyer("budi", "budi@example.com")).await.expect("Error creating buyer");
    let batik_house = db
        .insert_user(NewUser::supplier("batikhouse", "orders@batikhouse.id", "Batik House"))
        .await
        .expect("Error creating supplier");
    let kopi_jawa = db
        .insert_user(NewUser::supplier("kopijawa", "sales@kopijawa.id", "Kopi Jawa"))
        .await
        .expect("Error creating supplier");
    let batik_shirt = add_product(&db, &batik_house, "Batik Shirt", 150_000, 10).await;
    let silk_scarf = add_product(&db, &batik_house, "Silk Scarf", 85_000, 3).await;
    let arabica_beans = add_product(&db, &kopi_jawa, "Arabica Beans", 120_000, 20).await;
    Marketplace { db, siti, budi, batik_house, kopi_jawa, batik_shirt, silk_scarf, arabica_beans }
}

pub async fn add_product(db: &SqliteDatabase, supplier: &User, name: &str, price: i64, stock: i64) -> Product {
    db.insert_product(NewProduct::new(supplier.id, name, Money::from(price), stock))
        .await
        .expect("Error creating product")
}

pub async fn stock_of(db: &SqliteDatabase, product: &Product) -> i64 {
    db.fetch_product(product.id).await.expect("Error fetching product").expect("Product has vanished").stock_quantity
}
