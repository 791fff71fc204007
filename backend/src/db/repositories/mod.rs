//! Store implementations.
//!
//! `local` is an in-memory store used by tests and by the server when it runs
//! from a seed file.

pub mod local;

pub use local::LocalStore;
