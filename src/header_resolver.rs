//! Header Resolver - Maps export headers to semantic column roles
//!
//! Resolution is an exact, case-insensitive lookup of the trimmed header text
//! in a fixed alias table:
//! 1. Query, Page and Position resolve to at most one column each; spellings
//!    are tried in alias order ("Query" before "Keyword") and the first column
//!    with that spelling wins. Other matches are left alone
//! 2. Clicks/Impressions style metrics may match any number of columns
//! 3. Everything else is Unrecognized and passed through untouched
//!
//! There is no fuzzy matching: "Avg Pos." is not "Avg. Pos".

use crate::error::{CleanerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const QUERY_ALIASES: &[&str] = &["Query", "Queries", "query", "Keyword", "Keywords"];
const PAGE_ALIASES: &[&str] = &["Page", "page", "Landing Page", "Address"];
const POSITION_ALIASES: &[&str] = &[
    "Position",
    "position",
    "avg pos",
    "avg position",
    "Avg Position",
    "Avg. Pos",
    "Avg. Position",
];
const METRIC_ALIASES: &[&str] = &["Clicks", "Impressions", "click", "impression"];

/// Semantic role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Query,
    Page,
    Position,
    NumericMetric,
    Unrecognized,
}

impl ColumnRole {
    /// Roles that resolve to at most one column per table
    pub fn is_single(&self) -> bool {
        matches!(self, ColumnRole::Query | ColumnRole::Page | ColumnRole::Position)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnRole::Position | ColumnRole::NumericMetric)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnRole::Query => "Query",
            ColumnRole::Page => "Page",
            ColumnRole::Position => "Position",
            ColumnRole::NumericMetric => "Numeric",
            ColumnRole::Unrecognized => "Unrecognized",
        };
        f.pad(label)
    }
}

/// Accepted header spellings in priority order, normalized (trimmed, lowercased)
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(String, ColumnRole)>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let mut entries: Vec<(String, ColumnRole)> = Vec::new();
        for (list, role) in [
            (QUERY_ALIASES, ColumnRole::Query),
            (PAGE_ALIASES, ColumnRole::Page),
            (POSITION_ALIASES, ColumnRole::Position),
            (METRIC_ALIASES, ColumnRole::NumericMetric),
        ] {
            for alias in list {
                let alias = normalize_header(alias);
                if !entries.iter().any(|(existing, _)| *existing == alias) {
                    entries.push((alias, role));
                }
            }
        }
        Self { entries }
    }
}

impl AliasTable {
    /// Role of a header and the priority of its spelling (lower wins)
    fn rank(&self, header: &str) -> Option<(ColumnRole, usize)> {
        let normalized = normalize_header(header);
        self.entries
            .iter()
            .position(|(alias, _)| *alias == normalized)
            .map(|rank| (self.entries[rank].1, rank))
    }

    /// Role a single header would get, ignoring the one-column-per-role rule
    pub fn lookup(&self, header: &str) -> ColumnRole {
        self.rank(header)
            .map(|(role, _)| role)
            .unwrap_or(ColumnRole::Unrecognized)
    }

    /// Accepted spellings for a role, highest priority first
    pub fn aliases_for(&self, role: ColumnRole) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, r)| *r == role)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Role of every column of a table, by column index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    roles: Vec<ColumnRole>,
    /// Recognized columns in processing order: Query, Page, Position, then
    /// metrics by alias priority
    order: Vec<usize>,
}

impl RoleAssignment {
    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    pub fn role_of(&self, idx: usize) -> ColumnRole {
        self.roles
            .get(idx)
            .copied()
            .unwrap_or(ColumnRole::Unrecognized)
    }

    fn single(&self, role: ColumnRole) -> Option<usize> {
        self.roles.iter().position(|r| *r == role)
    }

    pub fn query_column(&self) -> Option<usize> {
        self.single(ColumnRole::Query)
    }

    pub fn page_column(&self) -> Option<usize> {
        self.single(ColumnRole::Page)
    }

    pub fn position_column(&self) -> Option<usize> {
        self.single(ColumnRole::Position)
    }

    /// Metric columns by alias priority, then column order
    pub fn metric_columns(&self) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|idx| self.roles[*idx] == ColumnRole::NumericMetric)
            .collect()
    }

    /// Columns that have a filter, with their roles, in processing order
    pub fn recognized(&self) -> impl Iterator<Item = (usize, ColumnRole)> + '_ {
        self.order.iter().map(move |idx| (*idx, self.roles[*idx]))
    }

    pub fn has_recognized(&self) -> bool {
        !self.order.is_empty()
    }
}

/// Assign a role to every header without failing when nothing matches.
///
/// For Query, Page and Position the column whose header is the
/// highest-priority spelling wins, ties going to the earlier column.
pub fn assign_roles<S: AsRef<str>>(headers: &[S], aliases: &AliasTable) -> RoleAssignment {
    let ranked: Vec<Option<(ColumnRole, usize)>> =
        headers.iter().map(|h| aliases.rank(h.as_ref())).collect();
    let mut roles = vec![ColumnRole::Unrecognized; headers.len()];
    let mut order = Vec::new();

    for role in [ColumnRole::Query, ColumnRole::Page, ColumnRole::Position] {
        let winner = ranked
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| match entry {
                Some((r, rank)) if *r == role => Some((*rank, idx)),
                _ => None,
            })
            .min();
        if let Some((_, idx)) = winner {
            roles[idx] = role;
            order.push(idx);
        }
    }

    let mut metrics: Vec<(usize, usize)> = ranked
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| match entry {
            Some((ColumnRole::NumericMetric, rank)) => Some((*rank, idx)),
            _ => None,
        })
        .collect();
    metrics.sort_unstable();
    for (_, idx) in metrics {
        roles[idx] = ColumnRole::NumericMetric;
        order.push(idx);
    }

    RoleAssignment { roles, order }
}

/// Resolve header roles, failing with `NoRelevantColumns` when no header matches
pub fn resolve_headers<S: AsRef<str>>(headers: &[S], aliases: &AliasTable) -> Result<RoleAssignment> {
    let assignment = assign_roles(headers, aliases);
    if !assignment.has_recognized() {
        return Err(CleanerError::NoRelevantColumns {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
        });
    }
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let aliases = AliasTable::default();

        assert_eq!(aliases.lookup("QUERY"), ColumnRole::Query);
        assert_eq!(aliases.lookup("  keywords "), ColumnRole::Query);
        assert_eq!(aliases.lookup("landing page"), ColumnRole::Page);
        assert_eq!(aliases.lookup("AVG. POSITION"), ColumnRole::Position);
        assert_eq!(aliases.lookup("Impression"), ColumnRole::NumericMetric);
        assert_eq!(aliases.lookup("Amount"), ColumnRole::Unrecognized);
        assert_eq!(aliases.lookup("Avg Pos."), ColumnRole::Unrecognized);
    }

    #[test]
    fn test_preferred_alias_wins_over_column_order() {
        let assignment = assign_roles(&["Keyword", "Query", "Clicks"], &AliasTable::default());

        assert_eq!(assignment.query_column(), Some(1));
        assert_eq!(assignment.role_of(0), ColumnRole::Unrecognized);
        assert_eq!(assignment.metric_columns(), vec![2]);

        let assignment = assign_roles(&["Address", "Landing Page", "avg pos", "Position"], &AliasTable::default());
        assert_eq!(assignment.page_column(), Some(1));
        assert_eq!(assignment.position_column(), Some(3));
        assert_eq!(assignment.role_of(0), ColumnRole::Unrecognized);
        assert_eq!(assignment.role_of(2), ColumnRole::Unrecognized);
    }

    #[test]
    fn test_same_alias_twice_keeps_first_column() {
        let assignment = assign_roles(&["Query", "query"], &AliasTable::default());
        assert_eq!(assignment.query_column(), Some(0));
        assert_eq!(assignment.role_of(1), ColumnRole::Unrecognized);
    }

    #[test]
    fn test_processing_order() {
        let assignment = assign_roles(
            &["Impressions", "Clicks", "Position", "Notes", "Page", "Query"],
            &AliasTable::default(),
        );
        let order: Vec<usize> = assignment.recognized().map(|(idx, _)| idx).collect();
        assert_eq!(order, vec![5, 4, 2, 1, 0]);
    }

    #[test]
    fn test_metrics_resolve_to_many_columns() {
        let assignment = resolve_headers(
            &["Keyword", "Address", "Impressions", "Impressions"],
            &AliasTable::default(),
        )
        .unwrap();

        assert_eq!(assignment.query_column(), Some(0));
        assert_eq!(assignment.page_column(), Some(1));
        assert_eq!(assignment.position_column(), None);
        assert_eq!(assignment.metric_columns(), vec![2, 3]);
    }

    #[test]
    fn test_no_relevant_columns() {
        let err = resolve_headers(&["Col1", "Col2"], &AliasTable::default()).unwrap_err();
        match err {
            CleanerError::NoRelevantColumns { headers } => {
                assert_eq!(headers, vec!["Col1".to_string(), "Col2".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_aliases_for_role() {
        let aliases = AliasTable::default();
        assert_eq!(aliases.aliases_for(ColumnRole::Page), vec!["page", "landing page", "address"]);
        assert_eq!(
            aliases.aliases_for(ColumnRole::Query),
            vec!["query", "queries", "keyword", "keywords"]
        );
    }
}
