//! SQLite project store.
//!
//! The durable catalog of configured projects plus the timestamp of the
//! last reconciliation pass. Uses WAL mode for concurrent reads during
//! writes.
//!
//! The interface is deliberately coarse: callers read the whole collection
//! at the start of an operation and write results back wholesale at the
//! end (`replace_projects`). That makes the last-writer-wins semantics of
//! batch reconciliation an explicit contract of this module rather than an
//! accident of the call sites.

use rusqlite::{Connection, OptionalExtension, Result as SqlResult, params};

use chrono::{DateTime, Utc};

use crate::project::{ProjectRecord, ProjectStatus, SyncStatus};

/// Meta-table key for the last reconciliation timestamp.
const LAST_SYNC_KEY: &str = "last_project_sync";

/// Database handle wrapping a SQLite connection.
pub struct ProjectStore {
    conn: Connection,
}

impl ProjectStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> SqlResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> SqlResult<()> {
        self.conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id                TEXT PRIMARY KEY,
                name              TEXT NOT NULL UNIQUE,
                team_name         TEXT,
                slack_token       TEXT NOT NULL UNIQUE,
                channels_json     TEXT NOT NULL DEFAULT '[]',
                channel_count     INTEGER NOT NULL DEFAULT 0,
                member_count      INTEGER NOT NULL DEFAULT 0,
                status            TEXT NOT NULL DEFAULT 'active',
                sync_status       TEXT,
                sync_error        TEXT,
                archived_channels INTEGER,
                last_synced       TEXT,
                created_at        TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// All projects, in creation order.
    pub fn load_projects(&self) -> SqlResult<Vec<ProjectRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, team_name, slack_token, channels_json, channel_count,
                    member_count, status, sync_status, sync_error, archived_channels,
                    last_synced, created_at
             FROM projects ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect()
    }

    /// One project by id.
    pub fn get_project(&self, id: &str) -> SqlResult<Option<ProjectRecord>> {
        self.conn
            .query_row(
                "SELECT id, name, team_name, slack_token, channels_json, channel_count,
                        member_count, status, sync_status, sync_error, archived_channels,
                        last_synced, created_at
                 FROM projects WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()
    }

    /// Replace the whole collection in one transaction.
    ///
    /// Last-writer-wins: anything written to the store since the caller
    /// loaded it is silently overwritten.
    pub fn replace_projects(&mut self, projects: &[ProjectRecord]) -> SqlResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM projects", [])?;
        for p in projects {
            insert_record(&tx, p)?;
        }
        tx.commit()
    }

    /// Insert a new project, or update the existing record that shares its
    /// name or token. Matching records keep their original `id` and
    /// `created_at` — provisioning the same workspace twice must not create
    /// a duplicate. Returns the stored record.
    pub fn upsert_project(&self, record: &ProjectRecord) -> SqlResult<ProjectRecord> {
        let existing = self
            .conn
            .query_row(
                "SELECT id, created_at FROM projects WHERE name = ?1 OR slack_token = ?2",
                params![record.name, record.slack_token],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let mut stored = record.clone();
        if let Some((id, created_at)) = existing {
            stored.id = id;
            stored.created_at = parse_ts(&created_at, 12)?;
            self.conn.execute(
                "DELETE FROM projects WHERE id = ?1",
                params![stored.id],
            )?;
        }
        insert_record(&self.conn, &stored)?;
        Ok(stored)
    }

    /// Update a project in place by id.
    pub fn update_project(&self, record: &ProjectRecord) -> SqlResult<bool> {
        let n = self.conn.execute(
            "UPDATE projects SET
                name = ?2, team_name = ?3, slack_token = ?4, channels_json = ?5,
                channel_count = ?6, member_count = ?7, status = ?8, sync_status = ?9,
                sync_error = ?10, archived_channels = ?11, last_synced = ?12
             WHERE id = ?1",
            params![
                record.id,
                record.name,
                record.team_name,
                record.slack_token,
                serde_json::to_string(&record.channels).unwrap_or_else(|_| "[]".into()),
                record.channel_count,
                record.member_count,
                record.status.as_str(),
                record.sync_status.map(|s| s.as_str()),
                record.sync_error,
                record.archived_channels,
                record.last_synced.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(n > 0)
    }

    /// Delete a project permanently. Returns false if the id was unknown.
    pub fn delete_project(&self, id: &str) -> SqlResult<bool> {
        let n = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    pub fn count_projects(&self) -> SqlResult<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
    }

    /// Timestamp of the last reconciliation pass, if any.
    pub fn get_last_sync(&self) -> SqlResult<Option<DateTime<Utc>>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![LAST_SYNC_KEY],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(s) => Ok(Some(parse_ts(&s, 0)?)),
            None => Ok(None),
        }
    }

    pub fn set_last_sync(&self, ts: DateTime<Utc>) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LAST_SYNC_KEY, ts.to_rfc3339()],
        )?;
        Ok(())
    }
}

fn insert_record(conn: &Connection, p: &ProjectRecord) -> SqlResult<()> {
    conn.execute(
        "INSERT INTO projects (id, name, team_name, slack_token, channels_json,
                               channel_count, member_count, status, sync_status,
                               sync_error, archived_channels, last_synced, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            p.id,
            p.name,
            p.team_name,
            p.slack_token,
            serde_json::to_string(&p.channels).unwrap_or_else(|_| "[]".into()),
            p.channel_count,
            p.member_count,
            p.status.as_str(),
            p.sync_status.map(|s| s.as_str()),
            p.sync_error,
            p.archived_channels,
            p.last_synced.map(|t| t.to_rfc3339()),
            p.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn row_to_record(row: &rusqlite::Row<'_>) -> SqlResult<ProjectRecord> {
    let channels_json: String = row.get(4)?;
    let channels: Vec<String> = serde_json::from_str(&channels_json).unwrap_or_default();
    let status: String = row.get(7)?;
    let sync_status: Option<String> = row.get(8)?;
    let last_synced: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        team_name: row.get(2)?,
        slack_token: row.get(3)?,
        channels,
        channel_count: row.get(5)?,
        member_count: row.get(6)?,
        status: ProjectStatus::parse(&status).unwrap_or(ProjectStatus::Active),
        sync_status: sync_status.as_deref().and_then(SyncStatus::parse),
        sync_error: row.get(9)?,
        archived_channels: row.get(10)?,
        last_synced: match last_synced {
            Some(s) => Some(parse_ts(&s, 11)?),
            None => None,
        },
        created_at: parse_ts(&created_at, 12)?,
    })
}

fn parse_ts(s: &str, column: usize) -> SqlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
