//! Domain models for the civic data hub.

mod address;
mod district;
mod geometry;
mod official;
mod sync_status;

pub use address::{normalize_address, CacheEntry, GeoPoint, CACHE_TTL_DAYS};
pub use district::{District, DistrictKey};
pub use geometry::{Boundary, BoundingBox, Ring};
pub use official::{Office, Official, OfficialKey};
pub use sync_status::{DataSourceStatus, SyncState};
