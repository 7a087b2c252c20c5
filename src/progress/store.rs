//! Progress persistence over the shared connection.
//!
//! All writes are single conditional statements: record creation is
//! `INSERT OR IGNORE`, item-set growth is `INSERT OR IGNORE` into a
//! one-row-per-item table, and status changes carry a WHERE guard that
//! only permits forward transitions. Concurrent writers therefore cannot
//! lose each other's contributions or regress a status.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::storage::DatabaseError;

use super::types::{CourseStatus, ProgressRecord};

pub struct ProgressStore<'a> {
    conn: &'a Connection,
}

impl<'a> ProgressStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create the progress record on first interaction; no-op if present.
    pub fn ensure_record(&self, child_id: Uuid, course_id: Uuid) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO progress_records
             (child_id, course_id, status, completed_at, created_at, updated_at)
             VALUES (?1, ?2, 'not_started', NULL, ?3, ?3)",
            params![child_id.to_string(), course_id.to_string(), now],
        )?;
        Ok(())
    }

    /// Load a progress record with its completed-item set.
    pub fn get(
        &self,
        child_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<ProgressRecord>, DatabaseError> {
        let row: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT status, completed_at FROM progress_records
                 WHERE child_id = ?1 AND course_id = ?2",
                params![child_id.to_string(), course_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((status_str, completed_at_str)) = row else {
            return Ok(None);
        };

        let status = CourseStatus::parse(&status_str).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("Unknown status: {}", status_str))
        })?;

        let completed_at = completed_at_str
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid date: {}", e)))?;

        Ok(Some(ProgressRecord {
            child_id,
            course_id,
            status,
            completed_item_ids: self.completed_items(child_id, course_id)?,
            completed_at,
        }))
    }

    /// Atomically add an item to the completion set.
    /// Returns whether the item was newly added.
    pub fn add_completed_item(
        &self,
        child_id: Uuid,
        course_id: Uuid,
        content_item_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO progress_items
             (child_id, course_id, content_item_id, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                child_id.to_string(),
                course_id.to_string(),
                content_item_id.to_string(),
                now
            ],
        )?;
        Ok(changed > 0)
    }

    /// The completed-item set for a (child, course).
    pub fn completed_items(
        &self,
        child_id: Uuid,
        course_id: Uuid,
    ) -> Result<HashSet<Uuid>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT content_item_id FROM progress_items
             WHERE child_id = ?1 AND course_id = ?2",
        )?;

        let rows = stmt.query_map(
            params![child_id.to_string(), course_id.to_string()],
            |row| row.get::<_, String>(0),
        )?;

        let mut items = HashSet::new();
        for row in rows {
            let id_str = row?;
            let id = Uuid::parse_str(&id_str).map_err(|e| {
                DatabaseError::DeserializationError(format!("Invalid item UUID: {}", e))
            })?;
            items.insert(id);
        }

        Ok(items)
    }

    /// Raise the status to at least `status`; never downgrades.
    /// Returns whether a transition happened.
    pub fn raise_status(
        &self,
        child_id: Uuid,
        course_id: Uuid,
        status: CourseStatus,
    ) -> Result<bool, DatabaseError> {
        // The WHERE guard names exactly the statuses below the target, so
        // a concurrent higher transition is never overwritten.
        let guard = match status {
            CourseStatus::Locked => return Ok(false),
            CourseStatus::NotStarted => "status IN ('locked')",
            CourseStatus::InProgress => "status IN ('locked', 'not_started')",
            CourseStatus::Completed => return self.mark_completed(child_id, course_id),
        };

        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "UPDATE progress_records SET status = ?1, updated_at = ?2
             WHERE child_id = ?3 AND course_id = ?4 AND {}",
            guard
        );

        let changed = self.conn.execute(
            &sql,
            params![
                status.as_str(),
                now,
                child_id.to_string(),
                course_id.to_string()
            ],
        )?;
        Ok(changed > 0)
    }

    /// Transition to completed, stamping `completed_at` exactly once.
    /// Returns whether this call performed the transition.
    pub fn mark_completed(&self, child_id: Uuid, course_id: Uuid) -> Result<bool, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE progress_records
             SET status = 'completed',
                 completed_at = COALESCE(completed_at, ?3),
                 updated_at = ?3
             WHERE child_id = ?1 AND course_id = ?2 AND status != 'completed'",
            params![child_id.to_string(), course_id.to_string(), now],
        )?;
        Ok(changed > 0)
    }

    /// All persisted statuses for a child, keyed by course.
    pub fn statuses_for_child(
        &self,
        child_id: Uuid,
    ) -> Result<HashMap<Uuid, (CourseStatus, Option<DateTime<Utc>>)>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT course_id, status, completed_at FROM progress_records
             WHERE child_id = ?1",
        )?;

        let rows = stmt.query_map(params![child_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut statuses = HashMap::new();
        for row in rows {
            let (course_str, status_str, completed_at_str) = row?;
            let course_id = Uuid::parse_str(&course_str).map_err(|e| {
                DatabaseError::DeserializationError(format!("Invalid course UUID: {}", e))
            })?;
            let status = CourseStatus::parse(&status_str).ok_or_else(|| {
                DatabaseError::DeserializationError(format!("Unknown status: {}", status_str))
            })?;
            let completed_at = completed_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
                .transpose()
                .map_err(|e| {
                    DatabaseError::DeserializationError(format!("Invalid date: {}", e))
                })?;
            statuses.insert(course_id, (status, completed_at));
        }

        Ok(statuses)
    }
}
