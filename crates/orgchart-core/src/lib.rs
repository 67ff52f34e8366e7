#![forbid(unsafe_code)]

//! Org chart data model (headless).
//!
//! Pipeline: raw table → [`normalize_table`] → [`PersonRepository::build`] →
//! [`Hierarchy::build`]. Layout and rendering live in `orgchart-render`.
//!
//! Design goals:
//! - pure, deterministic transforms (no global state)
//! - data-driven column matching ([`ColumnRules`])
//! - manager cycles are detected and reported instead of looping

pub mod error;
pub mod hierarchy;
pub mod person;
pub mod repository;
pub mod settings;
pub mod source;
pub mod table;

pub use error::{CycleError, Error, Result, SchemaError};
pub use hierarchy::Hierarchy;
pub use person::Person;
pub use repository::{DepartmentFilter, PersonRepository, select_people};
pub use settings::{Rgb, Settings, SettingsIoError, SettingsStore, TitleColors};
pub use source::{SourceFormat, load_raw_table, load_table, load_table_with_rules, read_csv};
pub use table::{
    CanonicalField, ColumnRule, ColumnRules, KeyMatcher, NormalizedRow, NormalizedTable, RawTable,
    canonical_column_key, normalize_table, normalize_table_with_rules,
};

#[cfg(test)]
mod tests;
