mod hierarchy;
mod repository;

use crate::*;

/// Builds a normalized table from `(user, name, dept, title, manager, mail)` tuples; empty strings
/// stand for absent cells.
pub(crate) fn table(rows: &[(&str, &str, &str, &str, &str, &str)]) -> NormalizedTable {
    let raw = RawTable::from_rows(
        ["Username", "Full Name", "Department", "Title", "Manager", "Mail"],
        rows.iter()
            .map(|r| vec![r.0, r.1, r.2, r.3, r.4, r.5])
            .collect::<Vec<_>>(),
    );
    normalize_table(&raw).unwrap()
}

pub(crate) fn sample_table() -> NormalizedTable {
    table(&[
        ("u1", "Alice", "Eng", "Lead", "", "a@x"),
        ("u2", "Bob", "Eng", "Dev", "u1", "b@x"),
        ("u3", "Cara", "Eng", "Dev", "u1", "c@x"),
    ])
}
