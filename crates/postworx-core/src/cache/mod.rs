//! Local cache of coworker rosters for shifts that have already happened.
//!
//! Past shifts cannot change, so their rendered roster is stored once and
//! reused on every later run. Shifts dated today or later are never stored.
//! The cache lives in a single JSON file (`shifts.json` in the cache
//! directory) keyed by `"<date> - <shift id>"`.

pub mod freshness;
pub mod key;
pub mod store;

pub use freshness::{is_cacheable, should_use_cache};
pub use key::CacheKey;
pub use store::ShiftCache;
