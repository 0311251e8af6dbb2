use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use recap_core::types::{ActionKind, RateLimitRecord};

use crate::error::MemoryError;

/// Durable last-invocation timestamps keyed by (channel, action).
pub trait RateLimitStore: Send + Sync {
    fn get(&self, channel_id: u64, action: ActionKind)
        -> Result<Option<DateTime<Utc>>, MemoryError>;

    /// Create or update the record. Never moves a timestamp backwards.
    fn upsert(
        &self,
        channel_id: u64,
        action: ActionKind,
        at: DateTime<Utc>,
    ) -> Result<(), MemoryError>;
}

/// SQLite-backed store. Thread-safe: wraps the connection in a Mutex.
pub struct SqliteRateLimitStore {
    db: Mutex<Connection>,
}

impl SqliteRateLimitStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every stored record, for diagnostics.
    pub fn records(&self) -> Result<Vec<RateLimitRecord>, MemoryError> {
        let db = self.conn();
        let mut stmt = db.prepare(
            "SELECT channel_id, action, last_invoked FROM rate_limits
             ORDER BY channel_id, action",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (channel_id, action, ts) = row?;
            let channel_id = channel_id as u64;
            let action = action
                .parse()
                .map_err(|reason| MemoryError::Corrupt { channel_id, reason })?;
            records.push(RateLimitRecord {
                channel_id,
                action,
                last_invoked: parse_ts(channel_id, &ts)?,
            });
        }
        Ok(records)
    }
}

impl RateLimitStore for SqliteRateLimitStore {
    fn get(
        &self,
        channel_id: u64,
        action: ActionKind,
    ) -> Result<Option<DateTime<Utc>>, MemoryError> {
        let db = self.conn();
        let ts: Option<String> = db
            .query_row(
                "SELECT last_invoked FROM rate_limits WHERE channel_id = ?1 AND action = ?2",
                rusqlite::params![channel_id as i64, action.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        ts.map(|ts| parse_ts(channel_id, &ts)).transpose()
    }

    fn upsert(
        &self,
        channel_id: u64,
        action: ActionKind,
        at: DateTime<Utc>,
    ) -> Result<(), MemoryError> {
        let db = self.conn();
        // Fixed-width UTC timestamps compare correctly as text.
        let ts = at.to_rfc3339_opts(SecondsFormat::Micros, true);
        db.execute(
            "INSERT INTO rate_limits (channel_id, action, last_invoked)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(channel_id, action)
             DO UPDATE SET last_invoked = MAX(last_invoked, excluded.last_invoked)",
            rusqlite::params![channel_id as i64, action.as_str(), ts],
        )?;
        debug!(channel_id, action = %action, at = %ts, "rate limit record upserted");
        Ok(())
    }
}

fn parse_ts(channel_id: u64, ts: &str) -> Result<DateTime<Utc>, MemoryError> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MemoryError::Corrupt {
            channel_id,
            reason: e.to_string(),
        })
}
