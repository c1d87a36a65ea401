//! Aggregation layer: load the flat CSV files into SQLite and query them.
//!
//! Loading is lossless and coercion-free: table column orders match the CSV
//! headers exactly and every value is inserted as text, letting column
//! affinity sort out the numerics. After loading, the declared data-quality
//! filters run once; all queries are read-only aggregates.

use std::path::Path;

use rusqlite::{params_from_iter, Connection};
use tracing::info;

use crate::config::{
    NODES_CSV, NODE_TAGS_CSV, REL_MEMBERS_CSV, REL_TAGS_CSV, WAYS_CSV, WAY_NODES_CSV, WAY_TAGS_CSV,
};
use crate::error::Result;

/// The three tag tables the quality filters apply to.
const TAG_TABLES: [&str; 3] = ["nodes_tags", "ways_tags", "rels_tags"];

/// (csv file, table, column count) for the bulk load.
const LOAD_PLAN: [(&str, &str, usize); 7] = [
    (NODES_CSV, "nodes", 8),
    (NODE_TAGS_CSV, "nodes_tags", 4),
    (WAYS_CSV, "ways", 6),
    (WAY_NODES_CSV, "ways_nodes", 3),
    (WAY_TAGS_CSV, "ways_tags", 4),
    (REL_TAGS_CSV, "rels_tags", 4),
    (REL_MEMBERS_CSV, "rels_members", 3),
];

/// Record tables that carry authorship columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTable {
    Nodes,
    Ways,
}

impl RecordTable {
    /// The SQL table name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Ways => "ways",
        }
    }
}

/// Open (or create) the database file.
pub fn open(path: &Path) -> Result<Connection> {
    Ok(Connection::open(path)?)
}

/// Declare the seven tables, dropping any previous load.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS nodes;
         DROP TABLE IF EXISTS nodes_tags;
         DROP TABLE IF EXISTS ways;
         DROP TABLE IF EXISTS ways_nodes;
         DROP TABLE IF EXISTS ways_tags;
         DROP TABLE IF EXISTS rels_tags;
         DROP TABLE IF EXISTS rels_members;
         CREATE TABLE nodes (id INTEGER, lat REAL, lon REAL, user TEXT, uid TEXT,
                             version TEXT, changeset TEXT, timestamp TEXT);
         CREATE TABLE nodes_tags (id INTEGER, key TEXT, value TEXT, type TEXT);
         CREATE TABLE ways (id INTEGER, user TEXT, uid TEXT, version TEXT,
                            changeset TEXT, timestamp TEXT);
         CREATE TABLE ways_nodes (id INTEGER, node_id INTEGER, position INTEGER);
         CREATE TABLE ways_tags (id INTEGER, key TEXT, value TEXT, type TEXT);
         CREATE TABLE rels_tags (id INTEGER, key TEXT, value TEXT, type TEXT);
         CREATE TABLE rels_members (reference INTEGER, role TEXT, type TEXT);",
    )?;
    Ok(())
}

/// Rows inserted per table by one bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows: Vec<(&'static str, usize)>,
}

impl LoadSummary {
    /// Total rows inserted across all tables.
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.iter().map(|(_, n)| n).sum()
    }
}

/// Bulk-load all seven CSV files from `dir`, one transaction for the lot.
pub fn load_csv_dir(conn: &mut Connection, dir: &Path) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();
    let tx = conn.transaction()?;

    for (file, table, columns) in LOAD_PLAN {
        let placeholders = vec!["?"; columns].join(", ");
        let sql = format!("INSERT INTO {table} VALUES ({placeholders})");
        let mut stmt = tx.prepare(&sql)?;

        let mut inserted = 0usize;
        let mut reader = csv::Reader::from_path(dir.join(file))?;
        for record in reader.records() {
            let record = record?;
            stmt.execute(params_from_iter(record.iter()))?;
            inserted += 1;
        }
        drop(stmt);

        info!(table, rows = inserted, "loaded");
        summary.rows.push((table, inserted));
    }

    tx.commit()?;
    Ok(summary)
}

/// Rows removed or rewritten by the declared data-quality filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QualityFilterSummary {
    /// Tag rows whose key was the 'fixme' sentinel.
    pub fixme_rows: usize,
    /// Tag rows whose type was 'not' or 'removed'.
    pub bad_type_rows: usize,
    /// Values rewritten from the 'centre' typo.
    pub centre_fixed: usize,
    /// Cuisine spellings collapsed to the canonical value.
    pub cuisine_collapsed: usize,
}

/// Apply the declared data-quality filters to all tag tables.
///
/// These are data-quality rules, not structural transforms: sentinel 'fixme'
/// keys and out-of-region 'not'/'removed' types are dropped, one value typo
/// is corrected, and three equivalent cuisine-category spellings collapse to
/// one canonical value.
pub fn apply_quality_filters(conn: &Connection) -> Result<QualityFilterSummary> {
    let mut summary = QualityFilterSummary::default();

    for table in TAG_TABLES {
        summary.fixme_rows +=
            conn.execute(&format!("DELETE FROM {table} WHERE key = 'fixme'"), [])?;
        summary.bad_type_rows += conn.execute(
            &format!("DELETE FROM {table} WHERE type IN ('not', 'removed')"),
            [],
        )?;
        summary.centre_fixed += conn.execute(
            &format!("UPDATE {table} SET value = 'center' WHERE value = 'centre'"),
            [],
        )?;
        summary.cuisine_collapsed += conn.execute(
            &format!(
                "UPDATE {table} SET value = 'indian'
                 WHERE value IN ('Nepalese,_Indian,_Tibetan', 'Indian,_South_East_Asian')"
            ),
            [],
        )?;
    }

    info!(
        fixme = summary.fixme_rows,
        bad_type = summary.bad_type_rows,
        "quality filters applied"
    );
    Ok(summary)
}

/// Row count of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: i64,
}

/// Entries attributed to one contributor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCount {
    pub user: String,
    pub entries: i64,
}

/// Entries within one time period (year or month).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCount {
    pub period: String,
    pub entries: i64,
}

/// Entries for one cuisine category, with its share of all cuisine tags.
#[derive(Debug, Clone, PartialEq)]
pub struct CuisineCount {
    pub cuisine: String,
    pub entries: i64,
    pub share_percent: f64,
}

/// Row counts for all seven tables.
pub fn table_counts(conn: &Connection) -> Result<Vec<TableCount>> {
    let mut counts = Vec::with_capacity(LOAD_PLAN.len());
    for (_, table, _) in LOAD_PLAN {
        let rows: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
        counts.push(TableCount { table, rows });
    }
    Ok(counts)
}

/// Number of distinct contributors to a record table.
pub fn distinct_user_count(conn: &Connection, table: RecordTable) -> Result<i64> {
    let count = conn.query_row(
        &format!("SELECT COUNT(DISTINCT uid) FROM {}", table.as_str()),
        [],
        |r| r.get(0),
    )?;
    Ok(count)
}

/// Top contributors to a record table, most entries first.
pub fn top_contributors(
    conn: &Connection,
    table: RecordTable,
    limit: usize,
) -> Result<Vec<UserCount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT user, COUNT(*) AS num FROM {}
         GROUP BY user
         ORDER BY num DESC
         LIMIT ?1",
        table.as_str()
    ))?;
    let rows = stmt
        .query_map([limit], |r| {
            Ok(UserCount {
                user: r.get(0)?,
                entries: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Entries per year for a record table, ascending.
pub fn records_by_year(conn: &Connection, table: RecordTable) -> Result<Vec<PeriodCount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT strftime('%Y', timestamp) AS year, COUNT(id) AS num FROM {}
         GROUP BY year
         ORDER BY year",
        table.as_str()
    ))?;
    let rows = stmt
        .query_map([], |r| {
            Ok(PeriodCount {
                period: r.get(0)?,
                entries: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Entries per month of one year for a record table.
pub fn records_by_month(
    conn: &Connection,
    table: RecordTable,
    year: u16,
) -> Result<Vec<PeriodCount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT strftime('%m', timestamp) AS month, COUNT(id) AS num FROM {}
         WHERE strftime('%Y', timestamp) = ?1
         GROUP BY month
         ORDER BY month",
        table.as_str()
    ))?;
    let rows = stmt
        .query_map([year.to_string()], |r| {
            Ok(PeriodCount {
                period: r.get(0)?,
                entries: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Cuisine categories on nodes, most common first, with share of total.
pub fn cuisine_counts(conn: &Connection, limit: usize) -> Result<Vec<CuisineCount>> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(id) FROM nodes_tags WHERE key = 'cuisine'",
        [],
        |r| r.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT value, COUNT(*) AS num FROM nodes_tags
         WHERE key = 'cuisine'
         GROUP BY value
         ORDER BY num DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit], |r| {
            let cuisine: String = r.get(0)?;
            let entries: i64 = r.get(1)?;
            Ok((cuisine, entries))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .map(|(cuisine, entries)| CuisineCount {
            cuisine,
            entries,
            share_percent: if total > 0 {
                entries as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect())
}

/// Distinct county values on ways.
///
/// Counties other than the export's own need manual inspection; the original
/// pipeline had no systematic policy for excluding out-of-region records, so
/// this stays a report rather than a filter.
pub fn county_values(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT value FROM ways_tags WHERE key = 'county' ORDER BY value",
    )?;
    let rows = stmt
        .query_map([], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(rows)
}

/// Count of way tags explicitly marked as not reviewed.
pub fn unreviewed_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM ways_tags WHERE key = 'reviewed' AND value = 'no'",
        [],
        |r| r.get(0),
    )?;
    Ok(count)
}
