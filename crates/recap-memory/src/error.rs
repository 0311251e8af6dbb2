use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupt rate-limit record for channel {channel_id}: {reason}")]
    Corrupt { channel_id: u64, reason: String },
}
