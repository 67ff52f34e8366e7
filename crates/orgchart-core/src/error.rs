use crate::table::CanonicalField;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error ({path}): {message}")]
    Spreadsheet { path: String, message: String },

    #[error("unsupported input format: {extension:?} (expected .csv, .xlsx, .xlsm, .xls or .ods)")]
    UnsupportedFormat { extension: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("no people match department filter {department:?}")]
    EmptySelection { department: String },

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("invalid column rules: {0}")]
    Rules(#[from] serde_json::Error),
}

/// Required canonical columns are missing after column mapping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "missing columns: {missing_list}\npresent: {present:?}",
    missing_list = format_fields(.missing)
)]
pub struct SchemaError {
    pub missing: Vec<CanonicalField>,
    /// Column headers as they appeared in the source, before mapping.
    pub present: Vec<String>,
}

fn format_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.header())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Manager references form a cycle.
///
/// `members` lists the usernames on the cycle in manager-link order (each entry reports to the
/// next; the last reports to the first).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("manager cycle detected: {}", .members.join(" -> "))]
pub struct CycleError {
    pub members: Vec<String>,
}
