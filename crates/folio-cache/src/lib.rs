// Client-side cache: a key-value store plus a timestamped envelope on top.
// The store never expires anything; freshness is the envelope's job.

pub mod envelope;
pub mod error;
pub mod store;

pub use envelope::{CacheEnvelope, CacheLookup, EnvelopeCache, EnvelopeInfo};
pub use error::{CacheError, Result};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
