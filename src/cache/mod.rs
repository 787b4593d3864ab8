//! LLM response caching with LRU eviction.

pub mod response_cache;

pub use response_cache::{CacheStats, ResponseCache};
