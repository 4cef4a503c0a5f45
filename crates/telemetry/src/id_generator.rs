//! Trace and span id generation.

use std::fmt;

use domain::{SpanId, TraceId};
use rand::Rng;

/// Source of new identifiers. Implementations never return invalid ids.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn new_trace_id(&self) -> TraceId;

    fn new_span_id(&self) -> SpanId;
}

/// Draws ids from the thread-local random number generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        let mut rng = rand::rng();
        loop {
            let id = TraceId::from(rng.random::<u128>());
            if id.is_valid() {
                return id;
            }
        }
    }

    fn new_span_id(&self) -> SpanId {
        let mut rng = rand::rng();
        loop {
            let id = SpanId::from(rng.random::<u64>());
            if id.is_valid() {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let generator = RandomIdGenerator;
        let trace_ids: HashSet<TraceId> = (0..100).map(|_| generator.new_trace_id()).collect();
        let span_ids: HashSet<SpanId> = (0..100).map(|_| generator.new_span_id()).collect();

        assert_eq!(trace_ids.len(), 100);
        assert_eq!(span_ids.len(), 100);
        assert!(trace_ids.iter().all(TraceId::is_valid));
        assert!(span_ids.iter().all(SpanId::is_valid));
    }
}
