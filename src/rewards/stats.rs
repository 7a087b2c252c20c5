//! Child stats projection.
//!
//! The engine never reads a child's current star total to decide anything;
//! it only pushes deltas through [`StatsSink`]. The SQLite-backed
//! [`StatsProjection`] is the default sink, maintaining the derived
//! `child_stats` table; deployments that own the child profile elsewhere
//! implement the trait against their own store.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::storage::DatabaseError;

use super::types::{ChildStats, StatsDelta};

/// Narrow seam through which the ledger applies stats mutations.
///
/// The ledger guarantees at-most-once invocation per grant, so
/// implementations do not need their own deduplication.
pub trait StatsSink {
    fn apply_stats_delta(&self, child_id: Uuid, delta: &StatsDelta) -> Result<(), DatabaseError>;
}

/// SQLite-backed stats projection over the `child_stats` table.
pub struct StatsProjection<'a> {
    conn: &'a Connection,
}

impl<'a> StatsProjection<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Current stats for a child; zeros when nothing has been granted yet.
    pub fn get(&self, child_id: Uuid) -> Result<ChildStats, DatabaseError> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT total_stars, badges_json FROM child_stats WHERE child_id = ?1",
                params![child_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((total_stars, badges_json)) => {
                let badges: Vec<Uuid> = serde_json::from_str(&badges_json).map_err(|e| {
                    DatabaseError::DeserializationError(format!("Invalid badges JSON: {}", e))
                })?;
                Ok(ChildStats {
                    child_id,
                    total_stars: total_stars.max(0) as u64,
                    badges,
                })
            }
            None => Ok(ChildStats::empty(child_id)),
        }
    }
}

impl StatsSink for StatsProjection<'_> {
    fn apply_stats_delta(&self, child_id: Uuid, delta: &StatsDelta) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();

        // Atomic upsert; the total never drops below zero even if a
        // revocation races a fresh projection row.
        self.conn.execute(
            "INSERT INTO child_stats (child_id, total_stars, badges_json, updated_at)
             VALUES (?1, MAX(0, ?2), '[]', ?3)
             ON CONFLICT(child_id) DO UPDATE SET
                 total_stars = MAX(0, total_stars + ?2),
                 updated_at = ?3",
            params![child_id.to_string(), delta.stars_delta, now],
        )?;

        if let Some(badge_id) = delta.badge_id {
            // json_insert with '$[#]' appends in place, no read-modify-write
            self.conn.execute(
                "UPDATE child_stats
                 SET badges_json = json_insert(badges_json, '$[#]', ?2), updated_at = ?3
                 WHERE child_id = ?1",
                params![child_id.to_string(), badge_id.to_string(), now],
            )?;
        }

        Ok(())
    }
}
