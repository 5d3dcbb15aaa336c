//! xkcdfetch library
//!
//! This module exposes the resolver, comic store and CLI modules for use in
//! the binary and in integration tests.

pub mod cache;
pub mod cli;
pub mod data;
