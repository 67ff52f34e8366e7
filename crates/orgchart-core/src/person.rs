use serde::{Deserialize, Serialize};

/// One employee record. Absent string attributes are stored as empty strings; only the manager
/// reference keeps an explicit `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub username: String,
    pub full_name: String,
    pub department: String,
    pub title: String,
    pub manager: Option<String>,
    pub mail: String,
}

impl Person {
    /// Full name, falling back to the username when the name is empty.
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }

    /// Case-insensitive sort key used for children and roots.
    pub fn sort_key(&self) -> String {
        self.full_name.to_lowercase()
    }
}
