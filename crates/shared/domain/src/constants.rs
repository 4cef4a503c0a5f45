//! Domain-level constants.
//!
//! Wire names and limits for W3C Trace Context and W3C Baggage, plus the
//! names used by the context round-trip endpoint.

// =============================================================================
// Trace Context
// =============================================================================

/// Header carrying version, trace id, parent id and flags
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header carrying vendor-specific trace state
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Only traceparent version emitted on inject
pub const SUPPORTED_TRACEPARENT_VERSION: u8 = 0x00;

/// Version value that is never valid
pub const INVALID_TRACEPARENT_VERSION: u8 = 0xff;

/// Maximum number of list members in a tracestate header
pub const MAX_TRACESTATE_ENTRIES: usize = 32;

// =============================================================================
// Baggage
// =============================================================================

/// Header carrying W3C baggage
pub const BAGGAGE_HEADER: &str = "baggage";

/// Maximum number of baggage entries
pub const MAX_BAGGAGE_ENTRIES: usize = 180;

/// Maximum serialized baggage size in bytes
pub const MAX_BAGGAGE_BYTES: usize = 8192;

// =============================================================================
// Context round trip
// =============================================================================

/// Instrumentation scope of the round-trip tracer
pub const DEFAULT_TRACER_NAME: &str = "example-tracer";

/// Name of the span that owns the injected context
pub const PARENT_SPAN_NAME: &str = "parent-span";

/// Name of the span started from the extracted context
pub const CHILD_SPAN_NAME: &str = "child-span";

/// Event recorded on the child span
pub const CHILD_SPAN_EVENT: &str = "Child span event: Processing with extracted context";

/// Body returned once both spans are created
pub const INJECT_EXTRACT_MESSAGE: &str = "Parent and child spans created and logged.";
