//! Host context interface for the digest pipeline.
//!
//! Implemented by `AppState` in `recap-gateway`. Defined here so channel
//! adapters depend on `recap-agent` only, not on the binary crate.

use recap_memory::RateLimiter;

use crate::runtime::AgentRuntime;

/// Minimal context interface required by [`run_digest`](super::run_digest).
pub trait DigestContext: Send + Sync {
    fn agent(&self) -> &AgentRuntime;
    fn limiter(&self) -> &RateLimiter;
}
