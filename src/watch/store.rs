//! Watch record persistence.
//!
//! A watch event is one atomic upsert: the counter increment, the
//! last-percentage update and the once-only completion stamp all happen in
//! a single statement, so concurrent events for the same key never lose an
//! increment.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::storage::DatabaseError;

use super::types::{WatchContext, WatchRecord};

pub struct WatchStore<'a> {
    conn: &'a Connection,
}

impl<'a> WatchStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record one watch event and return the updated record.
    ///
    /// `qualifying` marks whether this event crossed the completion
    /// threshold; the COALESCE keeps `first_completed_at` at its first
    /// value forever.
    pub fn record_watch(
        &self,
        child_id: Uuid,
        content_item_id: Uuid,
        context: WatchContext,
        percentage: f32,
        qualifying: bool,
    ) -> Result<WatchRecord, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let completed_at = qualifying.then(|| now.clone());

        self.conn.execute(
            "INSERT INTO watch_records
             (child_id, content_item_id, context, watch_count,
              last_completion_percentage, first_completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?6)
             ON CONFLICT(child_id, content_item_id, context) DO UPDATE SET
                 watch_count = watch_count + 1,
                 last_completion_percentage = excluded.last_completion_percentage,
                 first_completed_at = COALESCE(first_completed_at, excluded.first_completed_at),
                 updated_at = excluded.updated_at",
            params![
                child_id.to_string(),
                content_item_id.to_string(),
                context.as_str(),
                percentage,
                completed_at,
                now
            ],
        )?;

        self.get(child_id, content_item_id, context)?.ok_or_else(|| {
            DatabaseError::NotFound(format!(
                "Watch record for child {} item {}",
                child_id, content_item_id
            ))
        })
    }

    /// Load a watch record.
    pub fn get(
        &self,
        child_id: Uuid,
        content_item_id: Uuid,
        context: WatchContext,
    ) -> Result<Option<WatchRecord>, DatabaseError> {
        let row: Option<(i64, f64, Option<String>)> = self
            .conn
            .query_row(
                "SELECT watch_count, last_completion_percentage, first_completed_at
                 FROM watch_records
                 WHERE child_id = ?1 AND content_item_id = ?2 AND context = ?3",
                params![
                    child_id.to_string(),
                    content_item_id.to_string(),
                    context.as_str()
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((watch_count, last_percentage, first_completed_str)) = row else {
            return Ok(None);
        };

        let first_completed_at = first_completed_str
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid date: {}", e)))?;

        Ok(Some(WatchRecord {
            child_id,
            content_item_id,
            context,
            watch_count: watch_count.max(0) as u32,
            last_completion_percentage: last_percentage as f32,
            first_completed_at,
        }))
    }

    /// Administrative reset: zero the counter and clear completion marks.
    /// Returns whether a record existed.
    pub fn reset(
        &self,
        child_id: Uuid,
        content_item_id: Uuid,
        context: WatchContext,
    ) -> Result<bool, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE watch_records
             SET watch_count = 0,
                 last_completion_percentage = 0,
                 first_completed_at = NULL,
                 updated_at = ?4
             WHERE child_id = ?1 AND content_item_id = ?2 AND context = ?3",
            params![
                child_id.to_string(),
                content_item_id.to_string(),
                context.as_str(),
                now
            ],
        )?;
        Ok(changed > 0)
    }
}
