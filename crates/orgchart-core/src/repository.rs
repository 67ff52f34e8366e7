use crate::error::{Error, Result};
use crate::person::Person;
use crate::table::{NormalizedRow, NormalizedTable};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Department selection applied before building the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepartmentFilter {
    #[default]
    All,
    Only(String),
}

impl DepartmentFilter {
    /// Parses a picker value. `""`, `all` and `Tümü` (any case) select everything; anything else
    /// selects that exact department.
    pub fn parse(value: &str) -> Self {
        let t = value.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("all") || t.to_lowercase() == "tümü" {
            return DepartmentFilter::All;
        }
        DepartmentFilter::Only(t.to_string())
    }

    pub fn department(&self) -> Option<&str> {
        match self {
            DepartmentFilter::All => None,
            DepartmentFilter::Only(d) => Some(d.as_str()),
        }
    }

    fn accepts(&self, row: &NormalizedRow) -> bool {
        match self {
            DepartmentFilter::All => true,
            DepartmentFilter::Only(d) => row.department.as_deref() == Some(d.as_str()),
        }
    }
}

impl std::fmt::Display for DepartmentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepartmentFilter::All => f.write_str("all"),
            DepartmentFilter::Only(d) => f.write_str(d),
        }
    }
}

/// Username → person, in first-insertion order.
///
/// Duplicate user ids are resolved last-write-wins: the later row replaces the record but the
/// username keeps the position of its first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRepository {
    people: IndexMap<String, Person>,
}

impl PersonRepository {
    pub fn build(table: &NormalizedTable, filter: &DepartmentFilter) -> Self {
        let mut people: IndexMap<String, Person> = IndexMap::new();
        for row in table.rows.iter().filter(|r| filter.accepts(r)) {
            let username = row.user_id.as_deref().unwrap_or_default().trim();
            if username.is_empty() || username.eq_ignore_ascii_case("none") {
                continue;
            }
            let person = Person {
                username: username.to_string(),
                full_name: text(row.full_name.as_deref()),
                department: text(row.department.as_deref()),
                title: text(row.title.as_deref()),
                manager: row
                    .manager
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string),
                mail: text(row.mail.as_deref()),
            };
            if people.insert(username.to_string(), person).is_some() {
                tracing::debug!(%username, "duplicate user id, later row wins");
            }
        }
        Self { people }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn get(&self, username: &str) -> Option<&Person> {
        self.people.get(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.people.contains_key(username)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.people.keys().map(String::as_str)
    }

    /// Position of `username` in repository order (the stable tie-break for sorting).
    pub fn index_of(&self, username: &str) -> Option<usize> {
        self.people.get_index_of(username)
    }

    /// First person whose username or full name contains `query`, case-insensitively.
    pub fn search(&self, query: &str) -> Option<&Person> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }
        self.people.values().find(|p| {
            p.username.to_lowercase().contains(&q) || p.full_name.to_lowercase().contains(&q)
        })
    }
}

fn text(cell: Option<&str>) -> String {
    cell.map(str::trim).unwrap_or_default().to_string()
}

/// Builds the repository and rejects an empty result.
pub fn select_people(
    table: &NormalizedTable,
    filter: &DepartmentFilter,
) -> Result<PersonRepository> {
    let people = PersonRepository::build(table, filter);
    if people.is_empty() {
        return Err(Error::EmptySelection {
            department: filter.to_string(),
        });
    }
    tracing::debug!(count = people.len(), %filter, "people selected");
    Ok(people)
}
