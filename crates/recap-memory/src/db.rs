use rusqlite::{Connection, Result};

/// Initialise persistence tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_rate_limits_table(conn)?;
    Ok(())
}

/// One row per (channel, action). `last_invoked` is RFC 3339 UTC.
fn create_rate_limits_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS rate_limits (
            channel_id   INTEGER NOT NULL,
            action       TEXT NOT NULL,
            last_invoked TEXT NOT NULL,
            PRIMARY KEY (channel_id, action)
        );",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM rate_limits", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }
}
