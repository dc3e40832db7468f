//! Query layer over the project store: plain functions over `&Connection`.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, params, types::Type};

use crate::error::ParseEnumError;
use crate::gate::{ExecutionState, Phase, RegressionStatus};
use crate::model::defect::{Defect, Severity};
use crate::model::item::{Category, ChecklistItem};
use crate::model::review::{ReviewEntry, ReviewStatus};

fn parse_text_column<T>(index: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    T::from_str(value).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

// ---------------------------------------------------------------------------
// Checklist
// ---------------------------------------------------------------------------

/// Seed the checklist table from a template. Existing rows are left alone,
/// so re-running init does not clobber applicability edits.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub fn seed_checklist(conn: &Connection, items: &[ChecklistItem]) -> rusqlite::Result<usize> {
    let mut inserted = 0;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO checklist_items (item_id, title, category, applicable, position)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for item in items {
        inserted += stmt.execute(params![
            item.id,
            item.title,
            item.category.to_string(),
            i64::from(item.applicable),
            i64::from(item.position),
        ])?;
    }
    Ok(inserted)
}

/// All checklist items in workflow order.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_checklist(conn: &Connection) -> rusqlite::Result<Vec<ChecklistItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, title, category, applicable, position
         FROM checklist_items
         ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        let category: String = row.get(2)?;
        Ok(ChecklistItem {
            id: row.get(0)?,
            title: row.get(1)?,
            category: parse_text_column::<Category>(2, &category)?,
            applicable: row.get::<_, i64>(3)? != 0,
            position: row.get::<_, u32>(4)?,
        })
    })?;
    rows.collect()
}

/// Look up one checklist item by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_item(conn: &Connection, item_id: &str) -> rusqlite::Result<Option<ChecklistItem>> {
    conn.query_row(
        "SELECT item_id, title, category, applicable, position
         FROM checklist_items
         WHERE item_id = ?1",
        [item_id],
        |row| {
            let category: String = row.get(2)?;
            Ok(ChecklistItem {
                id: row.get(0)?,
                title: row.get(1)?,
                category: parse_text_column::<Category>(2, &category)?,
                applicable: row.get::<_, i64>(3)? != 0,
                position: row.get::<_, u32>(4)?,
            })
        },
    )
    .optional()
}

/// Set the applicability display flag. Returns the number of rows touched
/// (0 when the item does not exist).
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_applicable(
    conn: &Connection,
    item_id: &str,
    applicable: bool,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE checklist_items SET applicable = ?2 WHERE item_id = ?1",
        params![item_id, i64::from(applicable)],
    )
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

/// The current review judgements, keyed by item id.
///
/// Unknown status strings normalize to unreviewed rather than failing, so a
/// partially-written or newer-schema row never wedges the gate computation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_reviews(conn: &Connection) -> rusqlite::Result<BTreeMap<String, ReviewEntry>> {
    let mut stmt = conn.prepare("SELECT item_id, status, note, updated_at_us FROM reviews")?;
    let rows = stmt.query_map([], |row| {
        let status: String = row.get(1)?;
        Ok((
            row.get::<_, String>(0)?,
            ReviewEntry {
                status: ReviewStatus::parse_lossy(&status),
                note: row.get(2)?,
                updated_at_us: row.get(3)?,
            },
        ))
    })?;
    rows.collect()
}

/// Record a judgement for one item, replacing any previous one.
///
/// # Errors
///
/// Returns an error if the upsert fails (e.g. the item id is unknown).
pub fn upsert_review(
    conn: &Connection,
    item_id: &str,
    status: ReviewStatus,
    note: Option<&str>,
    now_us: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO reviews (item_id, status, note, updated_at_us)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(item_id) DO UPDATE SET
             status = excluded.status,
             note = excluded.note,
             updated_at_us = excluded.updated_at_us",
        params![item_id, status.to_string(), note, now_us],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Defects
// ---------------------------------------------------------------------------

/// Filters for `list_defects`. Default matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefectFilter {
    pub cycle: Option<u8>,
    pub derived: Option<bool>,
}

/// Next sequential defect id (`df-001`, `df-002`, ...). Defects are
/// append-only, so the row count is a stable cursor.
///
/// # Errors
///
/// Returns an error if the count query fails.
pub fn next_defect_id(conn: &Connection) -> rusqlite::Result<String> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM defects", [], |row| row.get(0))?;
    Ok(format!("df-{:03}", count + 1))
}

/// Append one defect record.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_defect(conn: &Connection, defect: &Defect) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO defects
             (defect_id, title, summary, severity, report_cycle, derived, created_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            defect.id,
            defect.title,
            defect.summary,
            defect.severity.to_string(),
            i64::from(defect.report_cycle),
            i64::from(defect.derived),
            defect.created_at_us,
        ],
    )?;
    Ok(())
}

/// Defects matching the filter, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_defects(conn: &Connection, filter: &DefectFilter) -> rusqlite::Result<Vec<Defect>> {
    let mut stmt = conn.prepare(
        "SELECT defect_id, title, summary, severity, report_cycle, derived, created_at_us
         FROM defects
         WHERE (?1 IS NULL OR report_cycle = ?1)
           AND (?2 IS NULL OR derived = ?2)
         ORDER BY created_at_us, defect_id",
    )?;
    let rows = stmt.query_map(
        params![
            filter.cycle.map(i64::from),
            filter.derived.map(i64::from)
        ],
        |row| {
            let severity: String = row.get(3)?;
            Ok(Defect {
                id: row.get(0)?,
                title: row.get(1)?,
                summary: row.get(2)?,
                severity: parse_text_column::<Severity>(3, &severity)?,
                report_cycle: row.get::<_, u8>(4)?,
                derived: row.get::<_, i64>(5)? != 0,
                created_at_us: row.get(6)?,
            })
        },
    )?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Project meta
// ---------------------------------------------------------------------------

/// The single project metadata row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMeta {
    pub name: String,
    pub finalized: bool,
    pub finalized_at_us: Option<i64>,
    pub created_at_us: i64,
}

/// Read the project metadata row.
///
/// # Errors
///
/// Returns an error if the query fails (the row always exists after
/// migration v1).
pub fn get_meta(conn: &Connection) -> rusqlite::Result<ProjectMeta> {
    conn.query_row(
        "SELECT name, finalized, finalized_at_us, created_at_us FROM project_meta WHERE id = 1",
        [],
        |row| {
            Ok(ProjectMeta {
                name: row.get(0)?,
                finalized: row.get::<_, i64>(1)? != 0,
                finalized_at_us: row.get(2)?,
                created_at_us: row.get(3)?,
            })
        },
    )
}

/// Record project name and creation time at init.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn init_meta(conn: &Connection, name: &str, now_us: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE project_meta SET name = ?1, created_at_us = ?2 WHERE id = 1",
        params![name, now_us],
    )?;
    Ok(())
}

/// Irreversibly mark the execution phase finalized. Returns `false` when it
/// already was.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_finalized(conn: &Connection, now_us: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE project_meta
         SET finalized = 1, finalized_at_us = ?1
         WHERE id = 1 AND finalized = 0",
        [now_us],
    )?;
    Ok(changed > 0)
}

// ---------------------------------------------------------------------------
// Gate snapshots
// ---------------------------------------------------------------------------

/// One persisted gate snapshot, as read back for `ct history`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GateSnapshot {
    pub snapshot_id: i64,
    pub phase: Phase,
    pub regression_status: RegressionStatus,
    pub allow_security_performance: bool,
    pub derived_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
}

fn micros_to_datetime(index: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_micros(micros).single().ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(index, micros)
    })
}

/// Append one snapshot of the computed execution state to the audit trail.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn append_snapshot(
    conn: &Connection,
    state: &ExecutionState,
    recorded_at_us: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO gate_snapshots
             (phase, regression_status, allow_security_performance, derived_found,
              finalized_at_us, recorded_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            state.phase.to_string(),
            state.feature_regression_status.to_string(),
            i64::from(state.allow_security_performance),
            i64::from(state.derived_found_in_feature_regression),
            state.finalized_at.map(|stamp| stamp.timestamp_micros()),
            recorded_at_us,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The newest `limit` snapshots, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_snapshots(conn: &Connection, limit: u32) -> rusqlite::Result<Vec<GateSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT snapshot_id, phase, regression_status, allow_security_performance,
                derived_found, finalized_at_us, recorded_at_us
         FROM gate_snapshots
         ORDER BY snapshot_id DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map([i64::from(limit)], |row| {
        let phase: String = row.get(1)?;
        let regression: String = row.get(2)?;
        let finalized_at_us: Option<i64> = row.get(5)?;
        Ok(GateSnapshot {
            snapshot_id: row.get(0)?,
            phase: parse_text_column::<Phase>(1, &phase)?,
            regression_status: parse_text_column::<RegressionStatus>(2, &regression)?,
            allow_security_performance: row.get::<_, i64>(3)? != 0,
            derived_found: row.get::<_, i64>(4)? != 0,
            finalized_at: finalized_at_us
                .map(|micros| micros_to_datetime(5, micros))
                .transpose()?,
            recorded_at: micros_to_datetime(6, row.get(6)?)?,
        })
    })?;
    rows.collect()
}
