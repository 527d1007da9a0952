//! Token Sentry Cloud API Module
//! REST façade over the scan pipeline and the canonical risk registry

pub mod handlers;
pub mod routes;
pub mod types;

pub use routes::create_router;
pub use types::*;
