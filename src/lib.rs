pub mod cleaner;
pub mod config;
pub mod error;
pub mod filters;
pub mod header_resolver;
pub mod io;
pub mod stats;
pub mod table;

pub use cleaner::{clean_table, Cleaner, CleaningOutcome, ColumnReport};
pub use config::CleanerConfig;
pub use error::{CleanerError, Result};
pub use header_resolver::{resolve_headers, AliasTable, ColumnRole, RoleAssignment};
pub use stats::{CleaningReport, CleaningStats};
pub use table::{Cell, Column, Table};
