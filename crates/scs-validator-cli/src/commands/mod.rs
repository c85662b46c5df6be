//! Command implementations.

pub mod validate;
