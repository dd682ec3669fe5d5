//! Statistics Reporter - Retention figures for a cleaning run
//!
//! Per-column figures count what each column's own filter removed. The overall
//! figures use the row count left after every filter's keep-mask has been
//! intersected, so they are not a sum of the per-column numbers.

use crate::cleaner::CleaningOutcome;
use crate::filters::{CellVerdict, RejectReason};
use crate::header_resolver::ColumnRole;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Final rows over original rows; defined as 0.0 for an empty input
pub fn retention_rate(original: usize, final_count: usize) -> f64 {
    if original == 0 {
        0.0
    } else {
        final_count as f64 / original as f64
    }
}

/// Counts for one filtered column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningStats {
    pub original_row_count: usize,
    pub removed_row_count: usize,
    pub final_row_count: usize,
    pub retention_rate: f64,
    /// Removed rows broken down by reason
    pub rejections: BTreeMap<RejectReason, usize>,
}

impl CleaningStats {
    pub fn from_verdicts(verdicts: &[CellVerdict]) -> Self {
        let mut rejections = BTreeMap::new();
        for reason in verdicts.iter().filter_map(CellVerdict::reject_reason) {
            *rejections.entry(reason).or_insert(0) += 1;
        }

        let original_row_count = verdicts.len();
        let removed_row_count: usize = rejections.values().sum();
        let final_row_count = original_row_count - removed_row_count;

        Self {
            original_row_count,
            removed_row_count,
            final_row_count,
            retention_rate: retention_rate(original_row_count, final_row_count),
            rejections,
        }
    }

    pub fn retention_percent(&self) -> f64 {
        self.retention_rate * 100.0
    }
}

/// One line of the per-column report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatsRow {
    pub column: String,
    pub role: ColumnRole,
    #[serde(flatten)]
    pub stats: CleaningStats,
}

/// Whole-table figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub original_rows: usize,
    pub cleaned_rows: usize,
    pub rows_removed: usize,
    pub retention_rate: f64,
}

impl OverallStats {
    pub fn new(original_rows: usize, cleaned_rows: usize) -> Self {
        Self {
            original_rows,
            cleaned_rows,
            rows_removed: original_rows.saturating_sub(cleaned_rows),
            retention_rate: retention_rate(original_rows, cleaned_rows),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    pub generated_at: DateTime<Utc>,
    pub columns: Vec<ColumnStatsRow>,
    pub overall: OverallStats,
}

impl CleaningReport {
    pub fn from_outcome(outcome: &CleaningOutcome) -> Self {
        let columns = outcome
            .columns
            .iter()
            .map(|c| ColumnStatsRow {
                column: c.header.clone(),
                role: c.role,
                stats: c.stats.clone(),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            columns,
            overall: OverallStats::new(outcome.original_row_count, outcome.table.row_count()),
        }
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cleaning Statistics")?;
        writeln!(
            f,
            "{:<24} {:<13} {:>13} {:>12} {:>10} {:>14}",
            "Column", "Role", "Original Rows", "Rows Removed", "Final Rows", "Retention Rate"
        )?;
        for row in &self.columns {
            writeln!(
                f,
                "{:<24} {:<13} {:>13} {:>12} {:>10} {:>13.1}%",
                row.column,
                row.role.to_string(),
                row.stats.original_row_count,
                row.stats.removed_row_count,
                row.stats.final_row_count,
                row.stats.retention_percent()
            )?;
            if !row.stats.rejections.is_empty() {
                let breakdown = row
                    .stats
                    .rejections
                    .iter()
                    .map(|(reason, count)| format!("{}: {}", reason, count))
                    .join(", ");
                writeln!(f, "    removed: {}", breakdown)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Overall Results")?;
        writeln!(f, "  Original Rows:  {}", self.overall.original_rows)?;
        writeln!(f, "  Cleaned Rows:   {}", self.overall.cleaned_rows)?;
        writeln!(f, "  Rows Removed:   {}", self.overall.rows_removed)?;
        write!(
            f,
            "  Retention Rate: {:.1}%",
            self.overall.retention_rate * 100.0
        )
    }
}
