use cucumber::given;
use marketplace_engine::{
    db_types::{Money, NewProduct, NewUser},
    CatalogManagement,
};

use crate::cucumber::{world::MarketplaceSystem, MarketWorld};

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut MarketWorld) {
    world.system = Some(MarketplaceSystem::new().await);
}

#[given(expr = "a buyer named {word}")]
async fn add_buyer(world: &mut MarketWorld, name: String) {
    let sys = world.system_mut();
    let email = format!("{name}@example.com");
    let user = sys.db.insert_user(NewUser::buyer(name.as_str(), email.as_str())).await.expect("Error creating buyer");
    sys.users.insert(name, user);
}

#[given(expr = "a supplier named {word} trading as {string}")]
async fn add_supplier(world: &mut MarketWorld, name: String, company: String) {
    let sys = world.system_mut();
    let email = format!("{name}@example.com");
    let user = sys
        .db
        .insert_user(NewUser::supplier(name.as_str(), email.as_str(), company.as_str()))
        .await
        .expect("Error creating supplier");
    sys.users.insert(name, user);
}

#[given(expr = "{word} sells {string} for {int} with {int} in stock")]
async fn add_product(world: &mut MarketWorld, supplier: String, product: String, price: i64, stock: i64) {
    let supplier_id = world.user(&supplier).id;
    let sys = world.system_mut();
    let new_product = NewProduct::new(supplier_id, product.as_str(), Money::from(price), stock);
    let product_record = sys.db.insert_product(new_product).await.expect("Error creating product");
    sys.products.insert(product, product_record);
}
