//! Civic data hub: address-to-officials resolution and multi-source sync.
//!
//! The lookup path geocodes an address through a persistent cache, finds the
//! legislative districts containing the point, and aggregates the officials
//! representing them. The sync engine keeps districts and officials current
//! from upstream sources, tracking per-source status.

pub mod cli;
pub mod config;
pub mod geocode;
pub mod lookup;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod sync;
