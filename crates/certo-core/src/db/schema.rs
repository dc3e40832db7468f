//! Canonical SQLite schema for the certo project store.
//!
//! Normalized for queryability:
//! - `checklist_items` holds the seeded template (plus the applicability flag)
//! - `reviews` keeps the latest judgement per item
//! - `defects` is append-only
//! - `gate_snapshots` is the append-only audit trail of computed phase state
//! - `project_meta` tracks schema version, project name, and finalization

/// Migration v1: core tables plus project metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS checklist_items (
    item_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    category TEXT NOT NULL CHECK (category IN ('setup', 'design', 'execution', 'completion')),
    applicable INTEGER NOT NULL DEFAULT 1 CHECK (applicable IN (0, 1)),
    position INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS reviews (
    item_id TEXT PRIMARY KEY REFERENCES checklist_items(item_id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'none',
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS defects (
    defect_id TEXT PRIMARY KEY,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    summary TEXT,
    severity TEXT NOT NULL CHECK (severity IN ('critical', 'major', 'minor', 'cosmetic')),
    report_cycle INTEGER NOT NULL CHECK (report_cycle BETWEEN 1 AND 4),
    derived INTEGER NOT NULL DEFAULT 0 CHECK (derived IN (0, 1)),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS gate_snapshots (
    snapshot_id INTEGER PRIMARY KEY AUTOINCREMENT,
    phase TEXT NOT NULL CHECK (phase IN ('INITIAL', 'PATCH1_REGRESSION', 'PATCH2_FINAL')),
    regression_status TEXT NOT NULL
        CHECK (regression_status IN ('PENDING', 'DERIVED_FOUND', 'PASS')),
    allow_security_performance INTEGER NOT NULL CHECK (allow_security_performance IN (0, 1)),
    derived_found INTEGER NOT NULL CHECK (derived_found IN (0, 1)),
    finalized_at_us INTEGER,
    recorded_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS project_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    finalized INTEGER NOT NULL DEFAULT 0 CHECK (finalized IN (0, 1)),
    finalized_at_us INTEGER,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO project_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: review notes and a defect-cycle index for `defect list`.
pub const MIGRATION_V2_SQL: &str = r"
ALTER TABLE reviews ADD COLUMN note TEXT;

CREATE INDEX IF NOT EXISTS idx_defects_report_cycle ON defects(report_cycle);
";
