//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the marketplace engine database *backends*.
//! The engine APIs never talk to a database directly. They are constructed with a backend value that implements the
//! traits they need, so that a backend can be swapped out (or mocked in tests) without touching the business logic.
//!
//! ## Traits
//!
//! * [`OrderFlowDatabase`] defines the write side of the order lifecycle: creating orders (including the stock
//!   decrement and multi-supplier checkouts), updating and deleting them.
//! * [`OrderManagement`] defines the behaviour for querying information about orders.
//! * [`CatalogManagement`] manages users and products.
//! * [`CartManagement`] manages the per-user cart rows.
//! * [`NotificationManagement`] stores and queries user notifications. Its futures are `Send`, because the
//!   notification dispatcher runs inside spawned event-handler tasks.
mod cart_management;
mod catalog_management;
mod notification_management;
mod order_flow_database;
mod order_management;

mod data_objects;

pub use cart_management::CartManagement;
pub use catalog_management::CatalogManagement;
pub use data_objects::{CheckoutResult, InsertOrderResult, OrderQueryFilter, StockShortfall};
pub use notification_management::NotificationManagement;
pub use order_flow_database::OrderFlowDatabase;
pub use order_management::OrderManagement;
