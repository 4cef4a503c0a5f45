//! HTTP handlers.

pub mod health_handler;
pub mod propagation_handler;

pub use health_handler::health_routes;
pub use propagation_handler::propagation_routes;
