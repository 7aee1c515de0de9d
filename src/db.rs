use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::app::{ProgressRecord, ProgressStore, ShowMeta};

const ENABLE_AUTOPLAY_KEY: &str = "enable_autoplay";

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    pub show_id: String,
    pub show_title: String,
    pub episode: u32,
    pub duration: f64,
    pub watched: f64,
    pub updated_at: String,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS progress_items (
                show_id TEXT NOT NULL,
                episode INTEGER NOT NULL,
                show_title TEXT NOT NULL,
                duration REAL NOT NULL,
                watched REAL NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (show_id, episode)
            );
            CREATE INDEX IF NOT EXISTS idx_progress_items_updated_at ON progress_items(updated_at DESC);
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn upsert_progress(
        &self,
        show_id: &str,
        show_title: &str,
        episode: u32,
        record: ProgressRecord,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO progress_items (show_id, episode, show_title, duration, watched, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(show_id, episode) DO UPDATE SET
                show_title = excluded.show_title,
                duration = excluded.duration,
                watched = excluded.watched,
                updated_at = excluded.updated_at
            "#,
            params![
                show_id,
                episode,
                show_title,
                record.duration,
                record.watched,
                now
            ],
        )?;
        Ok(())
    }

    pub fn progress_for(&self, show_id: &str, episode: u32) -> Result<Option<ProgressRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT duration, watched FROM progress_items WHERE show_id = ?1 AND episode = ?2",
                params![show_id, episode],
                |row| {
                    Ok(ProgressRecord {
                        duration: row.get(0)?,
                        watched: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn list_progress(&self) -> Result<Vec<ProgressEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT show_id, show_title, episode, duration, watched, updated_at FROM progress_items ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProgressEntry {
                show_id: row.get(0)?,
                show_title: row.get(1)?,
                episode: row.get(2)?,
                duration: row.get(3)?,
                watched: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn enable_autoplay(&self) -> Result<bool> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![ENABLE_AUTOPLAY_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref() != Some("false"))
    }

    pub fn set_enable_autoplay(&self, enabled: bool) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO preferences (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![ENABLE_AUTOPLAY_KEY, enabled.to_string()],
        )?;
        Ok(())
    }
}

impl ProgressStore for Database {
    fn update_item(&mut self, meta: &ShowMeta, progress: ProgressRecord) -> Result<()> {
        let Some(episode) = meta.current_number() else {
            return Ok(());
        };
        self.upsert_progress(&meta.id, &meta.title, episode, progress)
    }

    fn item(&self, show_id: &str, episode: u32) -> Result<Option<ProgressRecord>> {
        self.progress_for(show_id, episode)
    }
}
