//! Discord context interface, re-exported from the digest pipeline.
//!
//! `DiscordAppContext` is an alias for `recap_agent::pipeline::DigestContext`,
//! defined once in `recap-agent` so the adapter never depends on the binary.

pub use recap_agent::pipeline::DigestContext as DiscordAppContext;
