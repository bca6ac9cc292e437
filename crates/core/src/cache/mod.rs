pub mod index_cache;

pub use index_cache::{CacheEntry, CacheStats, IndexCache};
