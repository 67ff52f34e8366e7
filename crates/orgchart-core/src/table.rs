//! Column mapping and cell cleaning.
//!
//! Source headers are folded into a canonical key ([`canonical_column_key`]) and matched against
//! an ordered rule table ([`ColumnRules`]). The built-in table understands Turkish and English
//! headers; callers can extend it from JSON.

use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    UserId,
    FullName,
    Department,
    Title,
    Manager,
    Mail,
}

impl CanonicalField {
    /// Canonical column order.
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::UserId,
        CanonicalField::FullName,
        CanonicalField::Department,
        CanonicalField::Title,
        CanonicalField::Manager,
        CanonicalField::Mail,
    ];

    pub fn header(self) -> &'static str {
        match self {
            CanonicalField::UserId => "Username",
            CanonicalField::FullName => "Full Name",
            CanonicalField::Department => "Department",
            CanonicalField::Title => "Title",
            CanonicalField::Manager => "Manager",
            CanonicalField::Mail => "Mail",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// A table as read from disk: one header row plus string cells.
///
/// Rows may be ragged; missing trailing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn from_rows<C, R, S>(columns: C, rows: R) -> Self
    where
        C: IntoIterator<Item = S>,
        R: IntoIterator<Item = Vec<S>>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

/// How a rule tests a canonical column key. All keywords are given in folded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatcher {
    /// Every keyword occurs as a substring.
    AllOf(Vec<String>),
    /// At least one keyword occurs as a substring.
    AnyOf(Vec<String>),
    /// The key equals one of the keywords.
    Exact(Vec<String>),
}

impl KeyMatcher {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyMatcher::AllOf(words) => {
                !words.is_empty() && words.iter().all(|w| key.contains(w.as_str()))
            }
            KeyMatcher::AnyOf(words) => words.iter().any(|w| key.contains(w.as_str())),
            KeyMatcher::Exact(words) => words.iter().any(|w| w == key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub field: CanonicalField,
    #[serde(rename = "match")]
    pub matcher: KeyMatcher,
}

impl ColumnRule {
    pub fn new(field: CanonicalField, matcher: KeyMatcher) -> Self {
        Self { field, matcher }
    }
}

/// Ordered (matcher, field) table. The first matching rule wins for a given column.
///
/// JSON shape:
///
/// ```json
/// [{ "field": "title", "match": { "any_of": ["titel", "funktion"] } }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnRules(Vec<ColumnRule>);

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnRules {
    fn default() -> Self {
        use CanonicalField::*;
        Self(vec![
            ColumnRule::new(UserId, KeyMatcher::AllOf(words(&["kullanici", "adi"]))),
            ColumnRule::new(
                UserId,
                KeyMatcher::Exact(words(&[
                    "username",
                    "user name",
                    "user id",
                    "userid",
                    "login",
                    "account",
                ])),
            ),
            ColumnRule::new(
                FullName,
                KeyMatcher::Exact(words(&[
                    "ad soyad",
                    "isim",
                    "ad",
                    "soyad",
                    "adi soyadi",
                    "full name",
                    "fullname",
                    "name",
                    "employee",
                    "employee name",
                ])),
            ),
            ColumnRule::new(
                Department,
                KeyMatcher::AnyOf(words(&["departman", "department", "dept"])),
            ),
            ColumnRule::new(
                Title,
                KeyMatcher::AnyOf(words(&["pozisy", "gorev", "title", "unvan", "position"])),
            ),
            ColumnRule::new(
                Manager,
                KeyMatcher::AnyOf(words(&[
                    "ust",
                    "manager",
                    "yonetici",
                    "amiri",
                    "supervisor",
                    "reports to",
                ])),
            ),
            ColumnRule::new(Mail, KeyMatcher::AnyOf(words(&["mail", "e posta", "eposta"]))),
        ])
    }
}

impl ColumnRules {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn rules(&self) -> &[ColumnRule] {
        &self.0
    }

    /// Rules placed before the current ones (they take precedence).
    pub fn with_overrides(mut self, mut overrides: ColumnRules) -> Self {
        overrides.0.append(&mut self.0);
        overrides
    }

    /// Maps a raw header to a canonical field.
    pub fn classify(&self, header: &str) -> Option<CanonicalField> {
        let key = canonical_column_key(header);
        self.0
            .iter()
            .find(|r| r.matcher.matches(&key))
            .map(|r| r.field)
    }
}

/// Folds a header into its matching key: lowercase, diacritics stripped, `_`/`-` as spaces,
/// whitespace collapsed.
pub fn canonical_column_key(header: &str) -> String {
    let lowered = header.trim().to_lowercase();
    let mut folded = String::with_capacity(lowered.len());
    for ch in lowered.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        match ch {
            'ı' => folded.push('i'),
            '_' | '-' => folded.push(' '),
            c => folded.push(c),
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans one cell: trimmed; empty, `nan` and `none` (any case) become `None`.
pub fn clean_cell(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("nan") || t.eq_ignore_ascii_case("none") {
        return None;
    }
    Some(t.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub user_id: Option<String>,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub manager: Option<String>,
    pub mail: Option<String>,
}

impl NormalizedRow {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::UserId => self.user_id.as_deref(),
            CanonicalField::FullName => self.full_name.as_deref(),
            CanonicalField::Department => self.department.as_deref(),
            CanonicalField::Title => self.title.as_deref(),
            CanonicalField::Manager => self.manager.as_deref(),
            CanonicalField::Mail => self.mail.as_deref(),
        }
    }

    fn set(&mut self, field: CanonicalField, value: Option<String>) {
        let slot = match field {
            CanonicalField::UserId => &mut self.user_id,
            CanonicalField::FullName => &mut self.full_name,
            CanonicalField::Department => &mut self.department,
            CanonicalField::Title => &mut self.title,
            CanonicalField::Manager => &mut self.manager,
            CanonicalField::Mail => &mut self.mail,
        };
        *slot = value;
    }
}

/// The six canonical columns, in canonical order, with cleaned cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub rows: Vec<NormalizedRow>,
}

impl NormalizedTable {
    pub fn new(rows: Vec<NormalizedRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted distinct departments.
    pub fn departments(&self) -> Vec<String> {
        self.distinct(CanonicalField::Department)
    }

    /// Sorted distinct titles, used to populate a color editor.
    pub fn titles(&self) -> Vec<String> {
        self.distinct(CanonicalField::Title)
    }

    /// `(user id, full name)` pairs in row order for a root picker. Rows without a user id are
    /// skipped.
    pub fn user_choices(&self) -> Vec<(String, String)> {
        self.rows
            .iter()
            .filter_map(|r| {
                let id = r.user_id.as_deref()?;
                Some((
                    id.to_string(),
                    r.full_name.as_deref().unwrap_or_default().to_string(),
                ))
            })
            .collect()
    }

    fn distinct(&self, field: CanonicalField) -> Vec<String> {
        let set: std::collections::BTreeSet<&str> =
            self.rows.iter().filter_map(|r| r.get(field)).collect();
        set.into_iter().map(str::to_string).collect()
    }
}

pub fn normalize_table(raw: &RawTable) -> Result<NormalizedTable> {
    normalize_table_with_rules(raw, &ColumnRules::default())
}

pub fn normalize_table_with_rules(
    raw: &RawTable,
    rules: &ColumnRules,
) -> Result<NormalizedTable> {
    let mut source_index: [Option<usize>; 6] = [None; 6];
    for (idx, header) in raw.columns.iter().enumerate() {
        let Some(field) = rules.classify(header) else {
            tracing::debug!(column = %header, "column not mapped");
            continue;
        };
        let slot = &mut source_index[field.index()];
        if slot.is_some() {
            tracing::debug!(column = %header, %field, "duplicate mapping ignored");
            continue;
        }
        tracing::debug!(column = %header, %field, "column mapped");
        *slot = Some(idx);
    }

    let missing: Vec<CanonicalField> = CanonicalField::ALL
        .into_iter()
        .filter(|f| source_index[f.index()].is_none())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError {
            missing,
            present: raw.columns.clone(),
        }
        .into());
    }

    let rows = raw
        .rows
        .iter()
        .map(|cells| {
            let mut row = NormalizedRow::default();
            for field in CanonicalField::ALL {
                let value = source_index[field.index()]
                    .and_then(|i| cells.get(i))
                    .and_then(|c| clean_cell(c));
                row.set(field, value);
            }
            row
        })
        .collect();

    Ok(NormalizedTable { rows })
}
