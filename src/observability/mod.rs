//! Observability: structured logging lives in main (tracing-subscriber),
//! request metrics here.

pub mod metrics;
