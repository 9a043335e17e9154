use std::collections::HashMap;

use cucumber::World;
use log::*;
use marketplace_engine::{
    db_types::{Order, Product, User},
    events::EventProducers,
    CartApi,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};

use crate::support::prepare_env::{prepare_test_env, random_db_path};

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketplaceSystem>,
    pub last_order: Option<Order>,
    pub last_checkout: Vec<Order>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct MarketplaceSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub cart: CartApi<SqliteDatabase>,
    pub users: HashMap<String, User>,
    pub products: HashMap<String, Product>,
}

impl MarketWorld {
    pub fn system(&self) -> &MarketplaceSystem {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn system_mut(&mut self) -> &mut MarketplaceSystem {
        self.system.as_mut().expect("Marketplace not initialised")
    }

    pub fn user(&self, name: &str) -> &User {
        self.system().users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn product(&self, name: &str) -> &Product {
        self.system().products.get(name).unwrap_or_else(|| panic!("No product called {name}"))
    }

    pub fn last_order(&self) -> &Order {
        self.last_order.as_ref().expect("No order has been placed")
    }

    /// Keeps the outcome of an order operation for the `Then` steps.
    pub fn record(&mut self, result: Result<Order, OrderFlowError>) {
        match result {
            Ok(order) => {
                self.last_order = Some(order);
                self.last_error = None;
            },
            Err(e) => {
                debug!("🚀️ Order operation failed: {e}");
                self.last_error = Some(e.to_string());
            },
        }
    }
}

impl MarketplaceSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("🚀️ Created database: {db_path}");
        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        let cart = CartApi::new(db.clone());
        Self { db_path, db, orders, cart, users: HashMap::new(), products: HashMap::new() }
    }
}
