pub mod db;
pub mod error;
pub mod ratelimit;
pub mod store;

pub use error::MemoryError;
pub use ratelimit::{RateLimitError, RateLimitPermit, RateLimiter};
pub use store::{RateLimitStore, SqliteRateLimitStore};
