//! Cache module for storing fetched comics to disk
//!
//! This module provides the file layer behind the comic store: a single JSON
//! document that is loaded once at startup and rewritten in full after every
//! new fetch. Entries never expire.

mod manager;

pub use manager::{CacheFile, DEFAULT_CACHE_FILE};
