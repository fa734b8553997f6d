// Visa domain: status model and the deterministic timeline calculator.
// Pure date arithmetic only. No LLM calls, no I/O.

pub mod handlers;
pub mod models;
pub mod timeline;
