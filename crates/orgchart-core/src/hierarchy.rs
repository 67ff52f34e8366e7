//! Manager-reference hierarchy.
//!
//! Every username gets a (possibly empty) children list. A manager reference that does not resolve
//! to a person in the repository is dropped and the referencing person becomes a root; no
//! placeholder node is synthesized.

use crate::error::CycleError;
use crate::repository::PersonRepository;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    children: IndexMap<String, Vec<String>>,
    roots: Vec<String>,
    /// Resolved manager per username (only when the manager is present).
    #[serde(default)]
    parents: IndexMap<String, String>,
}

impl Hierarchy {
    pub fn build(people: &PersonRepository) -> Self {
        let mut children: IndexMap<String, Vec<String>> = people
            .usernames()
            .map(|u| (u.to_string(), Vec::new()))
            .collect();
        let mut parents: IndexMap<String, String> = IndexMap::new();

        for person in people.iter() {
            let Some(manager) = person.manager.as_deref() else {
                continue;
            };
            match children.get_mut(manager) {
                Some(list) => {
                    list.push(person.username.clone());
                    parents.insert(person.username.clone(), manager.to_string());
                }
                None => {
                    tracing::debug!(
                        username = %person.username,
                        %manager,
                        "manager not in selection, promoted to root"
                    );
                }
            }
        }

        // Ties on the lowercased name fall back to repository order.
        let sort = |list: &mut Vec<String>| {
            list.sort_by_cached_key(|u| {
                let key = people.get(u).map(|p| p.sort_key()).unwrap_or_default();
                (key, people.index_of(u).unwrap_or(usize::MAX))
            });
        };
        for list in children.values_mut() {
            sort(list);
        }
        let mut roots: Vec<String> = people
            .usernames()
            .filter(|u| !parents.contains_key(*u))
            .map(str::to_string)
            .collect();
        sort(&mut roots);

        Self {
            children,
            roots,
            parents,
        }
    }

    /// Children of `username` in display order; empty for leaves and unknown names.
    pub fn children(&self, username: &str) -> &[String] {
        self.children
            .get(username)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn children_map(&self) -> &IndexMap<String, Vec<String>> {
        &self.children
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn parent(&self, username: &str) -> Option<&str> {
        self.parents.get(username).map(String::as_str)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.children.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Finds a manager cycle, if any.
    ///
    /// Each person has at most one resolved manager, so any node not reachable from a root lies on
    /// a cycle or below one. The cycle is recovered by walking manager links from the first such
    /// node until a name repeats.
    pub fn detect_cycle(&self) -> Option<CycleError> {
        let mut reached: FxHashSet<&str> = FxHashSet::default();
        let mut stack: Vec<&str> = self.roots.iter().map(String::as_str).collect();
        while let Some(u) = stack.pop() {
            if !reached.insert(u) {
                continue;
            }
            stack.extend(self.children(u).iter().map(String::as_str));
        }
        if reached.len() == self.children.len() {
            return None;
        }

        let start = self
            .children
            .keys()
            .map(String::as_str)
            .find(|u| !reached.contains(u))?;

        let mut seen_at: FxHashMap<&str, usize> = FxHashMap::default();
        let mut walk: Vec<&str> = Vec::new();
        let mut cur = start;
        loop {
            if let Some(&i) = seen_at.get(cur) {
                let members = walk[i..].iter().map(|s| s.to_string()).collect();
                return Some(CycleError { members });
            }
            seen_at.insert(cur, walk.len());
            walk.push(cur);
            cur = self.parent(cur)?;
        }
    }

    pub fn ensure_acyclic(&self) -> Result<(), CycleError> {
        match self.detect_cycle() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
