//! The reward ledger: idempotent star and badge grants.
//!
//! Every grant is a single conditional insert against the ledger's unique
//! (child, subject, reward type) key. Zero rows changed means the entry
//! already existed; the caller gets `granted = false` and the existing
//! entry back. This is the only mutual-exclusion mechanism the engine
//! needs, and the only gate through which stats deltas are emitted.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::EngineError;
use crate::storage::DatabaseError;

use super::stats::StatsSink;
use super::types::{CourseGrantResult, GrantResult, RewardLedgerEntry, RewardType, StatsDelta};

/// Append-only, idempotent record of every star and badge grant.
pub struct RewardLedger<'a> {
    conn: &'a Connection,
    stats: &'a dyn StatsSink,
}

impl<'a> RewardLedger<'a> {
    pub fn new(conn: &'a Connection, stats: &'a dyn StatsSink) -> Self {
        Self { conn, stats }
    }

    /// Grant stars for a single content item (explore videos).
    pub fn grant_item_reward(
        &self,
        child_id: Uuid,
        content_item_id: Uuid,
        amount: u32,
        category: Option<&str>,
    ) -> Result<GrantResult, EngineError> {
        if amount == 0 {
            return Err(EngineError::validation("Reward amount must be positive"));
        }

        self.grant(
            child_id,
            content_item_id,
            RewardType::ItemStar,
            amount,
            None,
            category,
        )
    }

    /// Grant the course completion reward: stars, plus a badge when the
    /// course carries one. The two grants are independently idempotent, so
    /// a retried call that already gave stars still grants a missing badge
    /// without re-granting stars.
    pub fn grant_course_reward(
        &self,
        child_id: Uuid,
        course_id: Uuid,
        star_amount: u32,
        badge_id: Option<Uuid>,
    ) -> Result<CourseGrantResult, EngineError> {
        if star_amount == 0 {
            return Err(EngineError::validation("Reward amount must be positive"));
        }

        let stars = self.grant(
            child_id,
            course_id,
            RewardType::CourseStar,
            star_amount,
            None,
            None,
        )?;

        let badge = badge_id
            .map(|badge| {
                self.grant(
                    child_id,
                    course_id,
                    RewardType::CourseBadge,
                    0,
                    Some(badge),
                    None,
                )
            })
            .transpose()?;

        Ok(CourseGrantResult { stars, badge })
    }

    /// Pure query: has this reward already been granted?
    ///
    /// An optimization for callers; grant operations stay safe without it.
    pub fn has_granted(
        &self,
        child_id: Uuid,
        subject_id: Uuid,
        reward_type: RewardType,
    ) -> Result<bool, DatabaseError> {
        Ok(self.entry(child_id, subject_id, reward_type)?.is_some())
    }

    /// Stars already awarded for a single subject (0 when none).
    pub fn stars_awarded_for(
        &self,
        child_id: Uuid,
        subject_id: Uuid,
    ) -> Result<u32, DatabaseError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM reward_ledger
             WHERE child_id = ?1 AND subject_id = ?2",
            params![child_id.to_string(), subject_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u32)
    }

    /// Total stars earned for a subject category (explore video type).
    pub fn stars_for_category(
        &self,
        child_id: Uuid,
        category: &str,
    ) -> Result<u64, DatabaseError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM reward_ledger
             WHERE child_id = ?1 AND category = ?2",
            params![child_id.to_string(), category],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    /// Administrative: remove an item-star entry so the reward can be
    /// re-earned, emitting a compensating stats delta. Returns whether an
    /// entry was removed. Other entries for the child are untouched.
    pub fn revoke_item_reward(
        &self,
        child_id: Uuid,
        content_item_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let existing = self.entry(child_id, content_item_id, RewardType::ItemStar)?;

        let Some(entry) = existing else {
            return Ok(false);
        };

        let deleted = self
            .conn
            .execute("DELETE FROM reward_ledger WHERE id = ?1", params![entry.id])?;

        if deleted > 0 {
            if entry.amount > 0 {
                self.stats
                    .apply_stats_delta(child_id, &StatsDelta::stars(-(entry.amount as i64)))?;
            }
            tracing::info!(
                child = %child_id,
                subject = %content_item_id,
                "Revoked item reward"
            );
        }

        Ok(deleted > 0)
    }

    /// The single conditional check-and-set every grant goes through.
    fn grant(
        &self,
        child_id: Uuid,
        subject_id: Uuid,
        reward_type: RewardType,
        amount: u32,
        badge_id: Option<Uuid>,
        category: Option<&str>,
    ) -> Result<GrantResult, EngineError> {
        let now = Utc::now();

        let inserted = self.try_insert(
            child_id,
            subject_id,
            reward_type,
            amount,
            badge_id,
            category,
            now,
        )?;

        if inserted {
            // Exactly one stats-delta emission per actually-inserted row
            let delta = StatsDelta {
                stars_delta: amount as i64,
                badge_id,
            };
            self.stats.apply_stats_delta(child_id, &delta)?;
            tracing::info!(
                child = %child_id,
                subject = %subject_id,
                reward = %reward_type,
                amount,
                "Granted reward"
            );
        }

        let entry = self
            .entry(child_id, subject_id, reward_type)?
            .ok_or_else(|| {
                DatabaseError::NotFound(format!(
                    "Ledger entry for child {} subject {}",
                    child_id, subject_id
                ))
            })?;

        Ok(GrantResult {
            granted: inserted,
            entry,
        })
    }

    /// Conditional insert; returns whether a new row was created. A
    /// uniqueness violation from the store is the concurrent-duplicate
    /// path and reports the same as "already present".
    #[allow(clippy::too_many_arguments)]
    fn try_insert(
        &self,
        child_id: Uuid,
        subject_id: Uuid,
        reward_type: RewardType,
        amount: u32,
        badge_id: Option<Uuid>,
        category: Option<&str>,
        granted_at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = self.conn.execute(
            "INSERT INTO reward_ledger
             (child_id, subject_id, reward_type, amount, badge_id, category, granted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(child_id, subject_id, reward_type) DO NOTHING",
            params![
                child_id.to_string(),
                subject_id.to_string(),
                reward_type.as_str(),
                amount,
                badge_id.map(|b| b.to_string()),
                category,
                granted_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(changed) => Ok(changed > 0),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn entry(
        &self,
        child_id: Uuid,
        subject_id: Uuid,
        reward_type: RewardType,
    ) -> Result<Option<RewardLedgerEntry>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, child_id, subject_id, reward_type, amount, badge_id, category, granted_at
                 FROM reward_ledger
                 WHERE child_id = ?1 AND subject_id = ?2 AND reward_type = ?3",
                params![
                    child_id.to_string(),
                    subject_id.to_string(),
                    reward_type.as_str()
                ],
                parse_entry_row,
            )
            .optional()?;

        row.map(LedgerRow::into_entry).transpose()
    }
}

/// Intermediate struct for reading ledger rows from the database.
struct LedgerRow {
    id: i64,
    child_id: String,
    subject_id: String,
    reward_type: String,
    amount: i64,
    badge_id: Option<String>,
    category: Option<String>,
    granted_at: String,
}

fn parse_entry_row(row: &rusqlite::Row) -> rusqlite::Result<LedgerRow> {
    Ok(LedgerRow {
        id: row.get(0)?,
        child_id: row.get(1)?,
        subject_id: row.get(2)?,
        reward_type: row.get(3)?,
        amount: row.get(4)?,
        badge_id: row.get(5)?,
        category: row.get(6)?,
        granted_at: row.get(7)?,
    })
}

impl LedgerRow {
    fn into_entry(self) -> Result<RewardLedgerEntry, DatabaseError> {
        let child_id = Uuid::parse_str(&self.child_id)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?;

        let subject_id = Uuid::parse_str(&self.subject_id)
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid UUID: {}", e)))?;

        let reward_type = RewardType::parse(&self.reward_type).ok_or_else(|| {
            DatabaseError::DeserializationError(format!(
                "Unknown reward type: {}",
                self.reward_type
            ))
        })?;

        let badge_id = self
            .badge_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| {
                DatabaseError::DeserializationError(format!("Invalid badge UUID: {}", e))
            })?;

        let granted_at = DateTime::parse_from_rfc3339(&self.granted_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DatabaseError::DeserializationError(format!("Invalid date: {}", e)))?;

        Ok(RewardLedgerEntry {
            id: self.id,
            child_id,
            subject_id,
            reward_type,
            amount: self.amount.max(0) as u32,
            badge_id,
            category: self.category,
            granted_at,
        })
    }
}
