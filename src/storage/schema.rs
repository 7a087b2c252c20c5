//! Database schema definitions for the progress and reward engine.

/// SQL schema for creating all engine tables.
///
/// The only enforced uniqueness that carries behavioral weight is the
/// `reward_ledger` key: a conditional insert against it is the idempotency
/// guard for every star and badge grant. `progress_items` holds one row per
/// completed content item so that set growth is an atomic insert rather
/// than a read-modify-write of a serialized list.
pub const SCHEMA: &str = r#"
-- Per (child, course) progress status
CREATE TABLE IF NOT EXISTS progress_records (
    child_id TEXT NOT NULL,
    course_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'not_started',
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (child_id, course_id)
);

-- Completed content items, one row per item (monotonic set)
CREATE TABLE IF NOT EXISTS progress_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    child_id TEXT NOT NULL,
    course_id TEXT NOT NULL,
    content_item_id TEXT NOT NULL,
    completed_at TEXT NOT NULL,
    UNIQUE (child_id, course_id, content_item_id)
);

CREATE INDEX IF NOT EXISTS idx_progress_items_child_course
    ON progress_items(child_id, course_id);

-- Watch/view state per (child, video, context)
CREATE TABLE IF NOT EXISTS watch_records (
    child_id TEXT NOT NULL,
    content_item_id TEXT NOT NULL,
    context TEXT NOT NULL,
    watch_count INTEGER NOT NULL DEFAULT 0,
    last_completion_percentage REAL NOT NULL DEFAULT 0,
    first_completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (child_id, content_item_id, context)
);

-- Append-only reward grants; the UNIQUE key is the idempotency guard
CREATE TABLE IF NOT EXISTS reward_ledger (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    child_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    reward_type TEXT NOT NULL,
    amount INTEGER NOT NULL,
    badge_id TEXT,
    category TEXT,
    granted_at TEXT NOT NULL,
    UNIQUE (child_id, subject_id, reward_type)
);

CREATE INDEX IF NOT EXISTS idx_reward_ledger_child ON reward_ledger(child_id);
CREATE INDEX IF NOT EXISTS idx_reward_ledger_category
    ON reward_ledger(child_id, category);

-- Derived per-child stats projection, mutated only through StatsSink
CREATE TABLE IF NOT EXISTS child_stats (
    child_id TEXT PRIMARY KEY,
    total_stars INTEGER NOT NULL DEFAULT 0,
    badges_json TEXT NOT NULL DEFAULT '[]',
    updated_at TEXT NOT NULL
);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
