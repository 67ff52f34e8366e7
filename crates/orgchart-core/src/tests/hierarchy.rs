use super::{sample_table, table};
use crate::*;

fn hierarchy_of(t: &NormalizedTable) -> (PersonRepository, Hierarchy) {
    let people = PersonRepository::build(t, &DepartmentFilter::All);
    let h = Hierarchy::build(&people);
    (people, h)
}

#[test]
fn sample_builds_one_root_with_sorted_children() {
    let (_, h) = hierarchy_of(&sample_table());
    assert_eq!(h.roots(), ["u1"]);
    assert_eq!(h.children("u1"), ["u2", "u3"]);
    assert!(h.children("u2").is_empty());
    assert_eq!(h.parent("u3"), Some("u1"));
    assert_eq!(h.len(), 3);
}

#[test]
fn children_and_roots_sort_case_insensitively() {
    let t = table(&[
        ("boss", "Zed", "", "", "", ""),
        ("c", "charlie", "", "", "boss", ""),
        ("a", "Alpha", "", "", "boss", ""),
        ("b", "BRAVO", "", "", "boss", ""),
        ("r2", "anna", "", "", "", ""),
    ]);
    let (_, h) = hierarchy_of(&t);
    assert_eq!(h.children("boss"), ["a", "b", "c"]);
    assert_eq!(h.roots(), ["r2", "boss"]);
}

#[test]
fn equal_names_keep_repository_order() {
    let t = table(&[
        ("m", "Manager", "", "", "", ""),
        ("x2", "Sam", "", "", "m", ""),
        ("x1", "sam", "", "", "m", ""),
        ("x3", "SAM", "", "", "m", ""),
    ]);
    let (_, h) = hierarchy_of(&t);
    assert_eq!(h.children("m"), ["x2", "x1", "x3"]);
}

#[test]
fn equal_root_names_keep_repository_order() {
    let t = table(&[
        ("k2", "Kim", "", "", "", ""),
        ("k1", "KIM", "", "", "", ""),
        ("k3", "kim", "", "", "", ""),
        ("r", "Ada", "", "", "k1", ""),
    ]);
    let (_, h) = hierarchy_of(&t);
    assert_eq!(h.roots(), ["k2", "k1", "k3"]);
}

#[test]
fn dangling_manager_reference_promotes_to_root() {
    let t = table(&[
        ("u1", "Alice", "Eng", "Lead", "", ""),
        ("u2", "Bob", "Eng", "Dev", "ghost", ""),
    ]);
    let (_, h) = hierarchy_of(&t);
    assert_eq!(h.roots(), ["u1", "u2"]);
    assert!(!h.contains("ghost"));
    assert_eq!(h.parent("u2"), None);
}

#[test]
fn department_filter_orphans_reports_of_filtered_out_managers() {
    let t = table(&[
        ("ceo", "Ceo", "Board", "CEO", "", ""),
        ("e1", "Eve", "Eng", "Lead", "ceo", ""),
        ("e2", "Dan", "Eng", "Dev", "e1", ""),
    ]);
    let people = PersonRepository::build(&t, &DepartmentFilter::Only("Eng".to_string()));
    let h = Hierarchy::build(&people);
    assert_eq!(h.roots(), ["e1"]);
    assert_eq!(h.children("e1"), ["e2"]);
}

#[test]
fn every_person_is_either_a_root_or_has_a_parent() {
    let t = table(&[
        ("a", "A", "", "", "", ""),
        ("b", "B", "", "", "a", ""),
        ("c", "C", "", "", "b", ""),
        ("d", "D", "", "", "missing", ""),
        ("e", "E", "", "", "a", ""),
    ]);
    let (people, h) = hierarchy_of(&t);
    assert_eq!(h.children_map().len(), people.len());
    for u in people.usernames() {
        let is_root = h.roots().iter().any(|r| r == u);
        assert_ne!(is_root, h.parent(u).is_some(), "{u}");
    }
    let child_total: usize = h.children_map().values().map(Vec::len).sum();
    assert_eq!(child_total + h.roots().len(), people.len());
    assert!(h.ensure_acyclic().is_ok());
}

#[test]
fn two_node_cycle_is_detected() {
    let t = table(&[
        ("root", "Root", "", "", "", ""),
        ("a", "A", "", "", "b", ""),
        ("b", "B", "", "", "a", ""),
    ]);
    let (_, h) = hierarchy_of(&t);
    assert_eq!(h.roots(), ["root"]);
    let err = h.ensure_acyclic().unwrap_err();
    assert_eq!(err.members, vec!["a", "b"]);
    assert_eq!(err.to_string(), "manager cycle detected: a -> b");
}

#[test]
fn self_managed_person_is_a_cycle() {
    let t = table(&[("solo", "Solo", "", "", "solo", "")]);
    let (_, h) = hierarchy_of(&t);
    assert!(h.roots().is_empty());
    assert_eq!(h.detect_cycle().unwrap().members, vec!["solo"]);
}

#[test]
fn subtree_hanging_below_a_cycle_reports_the_cycle_only() {
    let t = table(&[
        ("tail", "Tail", "", "", "a", ""),
        ("a", "A", "", "", "c", ""),
        ("b", "B", "", "", "a", ""),
        ("c", "C", "", "", "b", ""),
    ]);
    let (_, h) = hierarchy_of(&t);
    let err = h.detect_cycle().unwrap();
    assert_eq!(err.members, vec!["a", "c", "b"]);
}
