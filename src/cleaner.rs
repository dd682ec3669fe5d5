//! Cleaning Orchestrator - Runs the header resolver and row filters over a table
//!
//! Row selection policy: every filtered column produces its own keep-mask, the
//! masks are intersected, and that single selection is applied to the whole
//! table. A surviving row keeps its query, page and metrics together.
//! Unrecognized columns are not filtered but still lose the rejected rows.

use crate::config::CleanerConfig;
use crate::error::Result;
use crate::filters::{CellVerdict, RowFilter};
use crate::header_resolver::{resolve_headers, AliasTable, ColumnRole, RoleAssignment};
use crate::stats::CleaningStats;
use crate::table::{Cell, Column, Table};
use tracing::{debug, info};

/// Stats for one filtered column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReport {
    pub index: usize,
    pub header: String,
    pub role: ColumnRole,
    pub stats: CleaningStats,
}

/// Result of a cleaning run
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub table: Table,
    pub roles: RoleAssignment,
    pub columns: Vec<ColumnReport>,
    pub original_row_count: usize,
}

impl CleaningOutcome {
    /// Stats of the first filtered column with the given header
    pub fn stats_for(&self, header: &str) -> Option<&CleaningStats> {
        self.columns
            .iter()
            .find(|c| c.header == header)
            .map(|c| &c.stats)
    }
}

pub struct Cleaner {
    aliases: AliasTable,
    config: CleanerConfig,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(CleanerConfig::default())
    }
}

impl Cleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self {
            aliases: AliasTable::default(),
            config,
        }
    }

    /// Clean `table` without modifying it.
    ///
    /// Fails with `NoRelevantColumns` before any filtering when no header
    /// resolves to a role. Columns are cleaned, and reported, in the order
    /// Query, Page, Position, then metrics.
    pub fn clean(&self, table: &Table) -> Result<CleaningOutcome> {
        let roles = resolve_headers(&table.headers(), &self.aliases)?;
        let row_count = table.row_count();

        let mut mask = vec![true; row_count];
        let mut reports = Vec::new();
        let mut cleaned_cells: Vec<Option<Vec<Cell>>> = vec![None; table.column_count()];

        for (idx, role) in roles.recognized() {
            let column = &table.columns()[idx];
            let filter = match RowFilter::for_role(role, &self.config) {
                Some(filter) => filter,
                None => continue,
            };

            info!("Cleaning {} column: {}", role, column.name);
            let verdicts = filter.apply(&column.cells);
            let stats = CleaningStats::from_verdicts(&verdicts);
            info!(
                "Column '{}': {} of {} rows rejected",
                column.name, stats.removed_row_count, stats.original_row_count
            );

            for (keep, verdict) in mask.iter_mut().zip(&verdicts) {
                *keep &= verdict.is_keep();
            }

            // Rejected cells keep their raw value; the mask drops those rows below.
            let cells = verdicts
                .into_iter()
                .zip(&column.cells)
                .map(|(verdict, raw)| match verdict {
                    CellVerdict::Keep(cleaned) => cleaned,
                    CellVerdict::Reject(_) => raw.clone(),
                })
                .collect();
            cleaned_cells[idx] = Some(cells);

            reports.push(ColumnReport {
                index: idx,
                header: column.name.clone(),
                role,
                stats,
            });
        }

        let columns = table
            .columns()
            .iter()
            .zip(cleaned_cells)
            .map(|(column, cleaned)| match cleaned {
                Some(cells) => Column::new(column.name.clone(), cells),
                None => {
                    debug!("Passing through column '{}'", column.name);
                    column.clone()
                }
            })
            .collect();

        let cleaned = Table::new(columns)?.select_rows(&mask)?;
        info!(
            "Cleaning complete: kept {} of {} rows",
            cleaned.row_count(),
            row_count
        );

        Ok(CleaningOutcome {
            table: cleaned,
            roles,
            columns: reports,
            original_row_count: row_count,
        })
    }
}

/// Clean a table with the default alias table
pub fn clean_table(table: &Table, config: &CleanerConfig) -> Result<CleaningOutcome> {
    Cleaner::new(config.clone()).clean(table)
}
