//! Aggregate counts over the document collection.
//!
//! Produces the numbers behind the statistics dashboard. Everything is read in one transaction
//! so the figures are mutually consistent.

use crate::config::CoreConfig;
use crate::labels::{Justification, LawType};
use crate::search::{next_day, parse_date, start_of_day};
use crate::store::{connect, timestamp_to_micros};
use crate::CoreResult;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Number of documents sharing one value of a categorical column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub key: String,
    pub total: u64,
}

/// Number of documents whose counter has the value `points`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PointsCount {
    pub points: u32,
    pub total: u64,
}

/// Number of documents created in a calendar month (`YYYY-MM`, UTC).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub total: u64,
}

/// Collection-wide statistics.
///
/// Categorical counts are ordered by descending total, then key. Points histograms are
/// ordered by descending counter value, monthly counts chronologically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentStatistics {
    pub total_documents: u64,
    pub user_document_counts: Vec<CategoryCount>,
    pub justification_counts: Vec<CategoryCount>,
    pub law_type_counts: Vec<CategoryCount>,
    pub npa_counts: Vec<CategoryCount>,
    pub status_counts: Vec<CategoryCount>,
    pub auth_points_counts: Vec<PointsCount>,
    pub care_points_counts: Vec<PointsCount>,
    pub loyal_points_counts: Vec<PointsCount>,
    pub fair_points_counts: Vec<PointsCount>,
    pub pur_points_counts: Vec<PointsCount>,
    pub non_points_counts: Vec<PointsCount>,
    pub monthly_counts: Vec<MonthlyCount>,
    /// Dominant justification -> law type -> count, with every pair present.
    pub justification_law_type_counts: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Statistics over documents created within a date range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DateRangeStatistics {
    pub total_documents: u64,
    pub user_document_counts: Vec<CategoryCount>,
}

#[derive(Clone, Debug)]
pub struct StatisticsService {
    cfg: Arc<CoreConfig>,
}

impl StatisticsService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn document_statistics(&self) -> CoreResult<DocumentStatistics> {
        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction()?;
        let all = Scope::default();

        let stats = DocumentStatistics {
            total_documents: total(&tx, &all)?,
            user_document_counts: category_counts(&tx, "owner", &all)?,
            justification_counts: category_counts(&tx, "dominant_justification", &all)?,
            law_type_counts: category_counts(&tx, "law_type", &all)?,
            npa_counts: category_counts(&tx, "npa", &all)?,
            status_counts: category_counts(&tx, "status", &all)?,
            auth_points_counts: points_counts(&tx, "auth_points")?,
            care_points_counts: points_counts(&tx, "care_points")?,
            loyal_points_counts: points_counts(&tx, "loyal_points")?,
            fair_points_counts: points_counts(&tx, "fair_points")?,
            pur_points_counts: points_counts(&tx, "pur_points")?,
            non_points_counts: points_counts(&tx, "non_points")?,
            monthly_counts: monthly_counts(&tx)?,
            justification_law_type_counts: justification_law_type_counts(&tx)?,
        };
        tx.commit()?;
        Ok(stats)
    }

    /// Counts documents created from the start of `start_date` through the end of `end_date`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if either date is not `YYYY-MM-DD`.
    pub fn date_range(&self, start_date: &str, end_date: &str) -> CoreResult<DateRangeStatistics> {
        let lower = start_of_day(parse_date(start_date)?);
        let upper = start_of_day(next_day(parse_date(end_date)?));
        let scope = Scope {
            clause: " WHERE created_at_us BETWEEN ?1 AND ?2",
            values: vec![
                Value::Integer(timestamp_to_micros(lower)),
                Value::Integer(timestamp_to_micros(upper)),
            ],
        };

        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction()?;
        let stats = DateRangeStatistics {
            total_documents: total(&tx, &scope)?,
            user_document_counts: category_counts(&tx, "owner", &scope)?,
        };
        tx.commit()?;
        Ok(stats)
    }
}

/// Restricts an aggregate to a subset of documents.
#[derive(Default)]
struct Scope {
    clause: &'static str,
    values: Vec<Value>,
}

fn total(conn: &Connection, scope: &Scope) -> CoreResult<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM documents{}", scope.clause),
        params_from_iter(scope.values.iter()),
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

// `column` is always one of the fixed column names above, never caller input.
fn category_counts(
    conn: &Connection,
    column: &str,
    scope: &Scope,
) -> CoreResult<Vec<CategoryCount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) AS total FROM documents{} \
         GROUP BY {column} ORDER BY total DESC, {column} ASC",
        scope.clause
    ))?;
    let rows = stmt.query_map(params_from_iter(scope.values.iter()), |row| {
        let total: i64 = row.get(1)?;
        Ok(CategoryCount {
            key: row.get(0)?,
            total: total.max(0) as u64,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn points_counts(conn: &Connection, column: &str) -> CoreResult<Vec<PointsCount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) FROM documents GROUP BY {column} ORDER BY {column} DESC"
    ))?;
    let rows = stmt.query_map([], |row| {
        let total: i64 = row.get(1)?;
        Ok(PointsCount {
            points: row.get(0)?,
            total: total.max(0) as u64,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn monthly_counts(conn: &Connection) -> CoreResult<Vec<MonthlyCount>> {
    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', created_at_us / 1000000, 'unixepoch') AS month, COUNT(*) \
         FROM documents GROUP BY month ORDER BY month ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let total: i64 = row.get(1)?;
        Ok(MonthlyCount {
            month: row.get(0)?,
            total: total.max(0) as u64,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn justification_law_type_counts(
    conn: &Connection,
) -> CoreResult<BTreeMap<String, BTreeMap<String, u64>>> {
    let mut matrix: BTreeMap<String, BTreeMap<String, u64>> = Justification::ALL
        .iter()
        .map(|j| {
            let row = LawType::ALL
                .iter()
                .map(|t| (t.as_str().to_string(), 0))
                .collect();
            (j.as_str().to_string(), row)
        })
        .collect();

    let mut stmt = conn.prepare(
        "SELECT dominant_justification, law_type, COUNT(*) FROM documents \
         GROUP BY dominant_justification, law_type",
    )?;
    let rows = stmt.query_map([], |row| {
        let count: i64 = row.get(2)?;
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            count.max(0) as u64,
        ))
    })?;
    for row in rows {
        let (justification, law_type, count) = row?;
        matrix
            .entry(justification)
            .or_default()
            .insert(law_type, count);
    }
    Ok(matrix)
}
