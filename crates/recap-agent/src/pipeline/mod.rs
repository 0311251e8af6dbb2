//! Transcript compaction pipeline.
//!
//! extract → compose → trim → complete → resolve references → chunk.
//! Channel adapters call [`run_digest`] and only handle display.

pub mod budget;
pub mod channel;
pub mod chunk;
pub mod compose;
pub mod context;
pub mod error;
pub mod normalize;
pub mod process;
pub mod references;
pub mod transcript;

pub use channel::{ChannelError, ChatChannel};
pub use context::DigestContext;
pub use error::PipelineError;
pub use process::{run_digest, Digest, DigestRequest};
pub use transcript::Transcript;
