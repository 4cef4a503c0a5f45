//! Service layer.

pub mod propagation_service;

pub use propagation_service::{ContextRoundTrip, PropagationService, RoundTrip};
