//! Daemon internals, exposed as a library so the accept loop and worker can
//! be driven directly by integration tests.

pub mod listener;
pub mod worker;
