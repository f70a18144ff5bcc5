pub mod actor;
pub mod config;
pub mod handler;
pub mod http;
pub mod observability;
pub mod server;
pub mod store;

pub use handler::BaseHandler;
pub use http::KvHttpHandler;
pub use store::{Engine, KvStore, StoreError};
