//! Per-session conversational memory.
//!
//! Each session keeps at most `N` exchanges; older ones are evicted
//! first. Sessions live for the lifetime of the process.

pub mod store;

pub use store::{Exchange, SessionStore};
