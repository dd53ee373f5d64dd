//! Pattern-based link store and redirect service.

pub mod client;
pub mod config;
pub mod http;
pub mod ids;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::schema::LinkConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
pub use store::{open_store, RouteStore};
