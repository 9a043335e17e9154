//! The public API of the marketplace engine.
//!
//! Each API is a thin struct over a backend value `B`. The trait bounds on `B` list exactly which parts of the
//! database contract the API needs, which keeps it easy to test each one against a mock.
pub mod analytics_api;
pub mod analytics_objects;
pub mod cart_api;
pub mod cart_objects;
pub mod errors;
pub mod notification_api;
pub mod order_flow_api;
pub mod order_objects;
