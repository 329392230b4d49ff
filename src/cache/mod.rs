pub mod fingerprint;
pub mod store;

pub use fingerprint::Fingerprint;
pub use store::{CacheOutcome, CacheStore, Freshness};
