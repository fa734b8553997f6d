// Assessment wizard: explicit session context, step state machine,
// in-memory session store and the HTTP handlers that drive them.

pub mod flow;
pub mod handlers;
pub mod session;
pub mod store;
