//! Demonstration rule tables.
//!
//! Consumer code: everything here drives the engine through its public API
//! and could live in a downstream crate unchanged.

pub mod latin;
