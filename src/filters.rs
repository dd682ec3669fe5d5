//! Row Filters - Per-role cell validation and normalization
//!
//! Each filter looks at one column's cells and returns a verdict per cell:
//! either the cleaned value to keep or the reason the row is rejected.
//! Malformed input is the expected rejection case, so filters never fail.

use crate::config::CleanerConfig;
use crate::header_resolver::ColumnRole;
use crate::table::Cell;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
}

/// Why a cell failed its column's filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Missing or whitespace-only cell
    Empty,
    /// Query written mostly in a non-Latin script
    NonLatin,
    /// Query that is actually a URL
    Url,
    /// Query with nothing left once special characters are stripped
    EmptyAfterNormalization,
    /// Page that is not an https URL
    NotHttps,
    /// Metric that does not coerce to a finite number
    NotNumeric,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RejectReason::Empty => "empty",
            RejectReason::NonLatin => "non-latin",
            RejectReason::Url => "url",
            RejectReason::EmptyAfterNormalization => "empty after cleanup",
            RejectReason::NotHttps => "not https",
            RejectReason::NotNumeric => "not numeric",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellVerdict {
    Keep(Cell),
    Reject(RejectReason),
}

impl CellVerdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, CellVerdict::Keep(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            CellVerdict::Keep(_) => None,
            CellVerdict::Reject(reason) => Some(*reason),
        }
    }
}

/// Keep-mask of a column's verdicts
pub fn keep_mask(verdicts: &[CellVerdict]) -> Vec<bool> {
    verdicts.iter().map(CellVerdict::is_keep).collect()
}

/// Filter applied to a column, chosen by its role
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowFilter {
    Query { latin_threshold: f64 },
    Page,
    Numeric,
}

impl RowFilter {
    /// Filter for a role; Unrecognized columns have none
    pub fn for_role(role: ColumnRole, config: &CleanerConfig) -> Option<Self> {
        match role {
            ColumnRole::Query => Some(RowFilter::Query {
                latin_threshold: config.latin_threshold,
            }),
            ColumnRole::Page => Some(RowFilter::Page),
            ColumnRole::Position | ColumnRole::NumericMetric => Some(RowFilter::Numeric),
            ColumnRole::Unrecognized => None,
        }
    }

    pub fn check(&self, cell: &Cell) -> CellVerdict {
        match self {
            RowFilter::Query { latin_threshold } => check_query(cell, *latin_threshold),
            RowFilter::Page => check_page(cell),
            RowFilter::Numeric => check_numeric(cell),
        }
    }

    pub fn apply(&self, cells: &[Cell]) -> Vec<CellVerdict> {
        cells.iter().map(|cell| self.check(cell)).collect()
    }
}

/// Latin-script letter test by code-point range.
///
/// Covers Basic Latin, the Latin-1 Supplement letters, Latin Extended-A/B,
/// Latin Extended Additional, Latin Extended-C/D/E and fullwidth Latin.
pub fn is_latin_letter(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '\u{00AA}'
        | '\u{00BA}'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{024F}'
        | '\u{1E00}'..='\u{1EFF}'
        | '\u{2C60}'..='\u{2C7F}'
        | '\u{A720}'..='\u{A7FF}'
        | '\u{AB30}'..='\u{AB6F}'
        | '\u{FF21}'..='\u{FF3A}'
        | '\u{FF41}'..='\u{FF5A}'
    )
}

/// Share of alphabetic characters that are Latin script.
///
/// Returns `None` when the text has no alphabetic characters at all, which the
/// query filter treats as undetermined. This is a heuristic: mixed-script
/// brand names and transliterated text are misclassified in both directions.
pub fn latin_ratio(text: &str) -> Option<f64> {
    let (latin, alphabetic) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(latin, total), c| {
            (latin + usize::from(is_latin_letter(c)), total + 1)
        });

    if alphabetic == 0 {
        None
    } else {
        Some(latin as f64 / alphabetic as f64)
    }
}

fn has_prefix_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
}

/// True for text starting with `http:` or `https:`, ignoring case and surrounding whitespace
pub fn looks_like_url(text: &str) -> bool {
    let trimmed = text.trim();
    has_prefix_ignore_case(trimmed, "http:") || has_prefix_ignore_case(trimmed, "https:")
}

/// Keep ASCII letters, digits and whitespace; collapse whitespace runs; trim
pub fn normalize_query(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

fn check_query(cell: &Cell, latin_threshold: f64) -> CellVerdict {
    let text = match cell.as_text() {
        Some(text) if !text.trim().is_empty() => text,
        _ => return CellVerdict::Reject(RejectReason::Empty),
    };

    if let Some(ratio) = latin_ratio(&text) {
        if ratio < latin_threshold {
            return CellVerdict::Reject(RejectReason::NonLatin);
        }
    }

    if looks_like_url(&text) {
        return CellVerdict::Reject(RejectReason::Url);
    }

    let normalized = normalize_query(&text);
    if normalized.is_empty() {
        return CellVerdict::Reject(RejectReason::EmptyAfterNormalization);
    }

    CellVerdict::Keep(Cell::Text(normalized))
}

fn check_page(cell: &Cell) -> CellVerdict {
    let text = match cell.as_text() {
        Some(text) if !text.trim().is_empty() => text,
        _ => return CellVerdict::Reject(RejectReason::Empty),
    };

    let trimmed = text.trim();
    if has_prefix_ignore_case(trimmed, "https:") {
        CellVerdict::Keep(Cell::Text(trimmed.to_string()))
    } else {
        CellVerdict::Reject(RejectReason::NotHttps)
    }
}

/// Coerce a cell to a finite number, preferring integers
pub fn coerce_numeric(cell: &Cell) -> Option<Cell> {
    match cell {
        Cell::Empty => None,
        Cell::Int(i) => Some(Cell::Int(*i)),
        Cell::Float(f) if f.is_finite() => Some(Cell::Float(*f)),
        Cell::Float(_) => None,
        Cell::Text(raw) => {
            let trimmed = raw.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(Cell::Int(i));
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Some(Cell::Float(f)),
                _ => None,
            }
        }
    }
}

fn check_numeric(cell: &Cell) -> CellVerdict {
    if cell.is_empty() {
        return CellVerdict::Reject(RejectReason::Empty);
    }
    match coerce_numeric(cell) {
        Some(number) => CellVerdict::Keep(number),
        None => CellVerdict::Reject(RejectReason::NotNumeric),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: &str) -> CellVerdict {
        RowFilter::Query {
            latin_threshold: 0.7,
        }
        .check(&Cell::from_raw(raw))
    }

    fn kept_text(verdict: CellVerdict) -> String {
        match verdict {
            CellVerdict::Keep(Cell::Text(s)) => s,
            other => panic!("expected kept text, got {other:?}"),
        }
    }

    #[test]
    fn test_latin_ratio() {
        assert_eq!(latin_ratio("python tutorial"), Some(1.0));
        assert_eq!(latin_ratio("日本語のクエリ"), Some(0.0));
        assert_eq!(latin_ratio("café crème"), Some(1.0));
        assert_eq!(latin_ratio("1234 !!"), None);
        assert_eq!(latin_ratio("abc日"), Some(0.75));
    }

    #[test]
    fn test_query_strips_special_characters() {
        assert_eq!(kept_text(query("buy-now!! cheap***")), "buynow cheap");
        assert_eq!(kept_text(query("  running   shoes\tsale ")), "running shoes sale");
    }

    #[test]
    fn test_query_rejections() {
        assert_eq!(query("日本語のクエリ"), CellVerdict::Reject(RejectReason::NonLatin));
        assert_eq!(query("https://example.com"), CellVerdict::Reject(RejectReason::Url));
        assert_eq!(query(" HTTP:foo"), CellVerdict::Reject(RejectReason::Url));
        assert_eq!(query(""), CellVerdict::Reject(RejectReason::Empty));
        assert_eq!(query("   "), CellVerdict::Reject(RejectReason::Empty));
        assert_eq!(
            query("***"),
            CellVerdict::Reject(RejectReason::EmptyAfterNormalization)
        );
    }

    #[test]
    fn test_query_without_letters_is_kept() {
        assert_eq!(kept_text(query("2024")), "2024");
        assert_eq!(
            RowFilter::Query { latin_threshold: 0.7 }.check(&Cell::Int(42)),
            CellVerdict::Keep(Cell::Text("42".to_string()))
        );
    }

    #[test]
    fn test_query_threshold_is_inclusive() {
        let filter = RowFilter::Query { latin_threshold: 0.75 };
        assert!(filter.check(&Cell::from("abc日")).is_keep());

        let filter = RowFilter::Query { latin_threshold: 0.8 };
        assert_eq!(
            filter.check(&Cell::from("abc日")),
            CellVerdict::Reject(RejectReason::NonLatin)
        );
    }

    #[test]
    fn test_page_filter() {
        assert_eq!(
            RowFilter::Page.check(&Cell::from("https://example.com/x")),
            CellVerdict::Keep(Cell::Text("https://example.com/x".to_string()))
        );
        assert_eq!(
            RowFilter::Page.check(&Cell::from("  HTTPS://example.com/y ")),
            CellVerdict::Keep(Cell::Text("HTTPS://example.com/y".to_string()))
        );
        assert_eq!(
            RowFilter::Page.check(&Cell::from("http://example.com")),
            CellVerdict::Reject(RejectReason::NotHttps)
        );
        assert_eq!(
            RowFilter::Page.check(&Cell::from("example.com")),
            CellVerdict::Reject(RejectReason::NotHttps)
        );
        assert_eq!(
            RowFilter::Page.check(&Cell::Empty),
            CellVerdict::Reject(RejectReason::Empty)
        );
    }

    #[test]
    fn test_numeric_filter() {
        assert_eq!(RowFilter::Numeric.check(&Cell::from("150")), CellVerdict::Keep(Cell::Int(150)));
        assert_eq!(RowFilter::Numeric.check(&Cell::from(" 3.5 ")), CellVerdict::Keep(Cell::Float(3.5)));
        assert_eq!(RowFilter::Numeric.check(&Cell::from("1e3")), CellVerdict::Keep(Cell::Float(1000.0)));
        assert_eq!(RowFilter::Numeric.check(&Cell::Float(2.0)), CellVerdict::Keep(Cell::Float(2.0)));
        assert_eq!(
            RowFilter::Numeric.check(&Cell::from("xx")),
            CellVerdict::Reject(RejectReason::NotNumeric)
        );
        assert_eq!(
            RowFilter::Numeric.check(&Cell::from("NaN")),
            CellVerdict::Reject(RejectReason::NotNumeric)
        );
        for sentinel in ["inf", "-inf", "Infinity"] {
            assert_eq!(
                RowFilter::Numeric.check(&Cell::from(sentinel)),
                CellVerdict::Reject(RejectReason::NotNumeric)
            );
        }
        assert_eq!(
            RowFilter::Numeric.check(&Cell::Empty),
            CellVerdict::Reject(RejectReason::Empty)
        );
    }

    #[test]
    fn test_filter_for_role() {
        let config = CleanerConfig::default();
        assert_eq!(RowFilter::for_role(ColumnRole::Position, &config), Some(RowFilter::Numeric));
        assert_eq!(RowFilter::for_role(ColumnRole::Page, &config), Some(RowFilter::Page));
        assert_eq!(RowFilter::for_role(ColumnRole::Unrecognized, &config), None);
    }

    #[test]
    fn test_keep_mask() {
        let verdicts = RowFilter::Numeric.apply(&[Cell::from("1"), Cell::from("x"), Cell::Int(3)]);
        assert_eq!(keep_mask(&verdicts), vec![true, false, true]);
    }
}
