//! Marketplace Engine
//!
//! The marketplace engine is the domain core of a multi-vendor marketplace: buyers fill a cart with products from
//! any number of suppliers and check out, and suppliers fulfil the resulting orders. This library contains the
//! business logic only. It knows nothing about HTTP, sessions or page rendering.
//!
//! The library is divided into these main sections:
//! 1. Database management and control ([`traits`] and [`SqliteDatabase`]). The engine APIs are generic over the
//!    backend traits; SQLite is the supplied backend. The data types stored in the database are defined in
//!    [`mod@db_types`] and are public.
//! 2. The engine public API ([`mod@mkt_api`]): [`OrderFlowApi`] for the order lifecycle, [`CartApi`] for carts,
//!    [`AnalyticsApi`] for supplier and buyer dashboards and [`NotificationApi`] for user inboxes.
//! 3. Events ([`mod@events`]) and their default subscriber ([`mod@notifier`]). Order and payment changes are
//!    published on channels, and the notifier turns them into stored notifications and emails. Dispatch runs in its
//!    own tasks, so it can never fail or slow down the operation that triggered it.
mod db;

pub mod config;
pub mod db_types;
pub mod events;
pub mod mkt_api;
pub mod notifier;

pub use config::MarketplaceConfig;
#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{
    self,
    CartManagement,
    CatalogManagement,
    CheckoutResult,
    InsertOrderResult,
    NotificationManagement,
    OrderFlowDatabase,
    OrderManagement,
    OrderQueryFilter,
    StockShortfall,
};
pub use mkt_api::{
    analytics_api::AnalyticsApi,
    analytics_objects,
    cart_api::CartApi,
    cart_objects::Cart,
    errors::{CartApiError, NotificationApiError, OrderFlowError, ValidationError},
    notification_api::NotificationApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
