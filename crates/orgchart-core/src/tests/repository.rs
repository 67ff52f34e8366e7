use super::{sample_table, table};
use crate::*;

#[test]
fn build_creates_one_person_per_row() {
    let people = PersonRepository::build(&sample_table(), &DepartmentFilter::All);
    assert_eq!(people.len(), 3);
    let bob = people.get("u2").unwrap();
    assert_eq!(
        bob,
        &Person {
            username: "u2".to_string(),
            full_name: "Bob".to_string(),
            department: "Eng".to_string(),
            title: "Dev".to_string(),
            manager: Some("u1".to_string()),
            mail: "b@x".to_string(),
        }
    );
    assert_eq!(people.get("u1").unwrap().manager, None);
}

#[test]
fn rows_without_user_id_are_skipped() {
    let t = table(&[
        ("", "Ghost", "Eng", "Dev", "", ""),
        ("none", "Also Ghost", "Eng", "Dev", "", ""),
        ("u1", "Alice", "Eng", "Lead", "", ""),
    ]);
    let people = PersonRepository::build(&t, &DepartmentFilter::All);
    assert_eq!(people.usernames().collect::<Vec<_>>(), vec!["u1"]);
}

#[test]
fn duplicate_user_id_is_last_write_wins() {
    let t = table(&[
        ("u1", "Alice", "Eng", "Lead", "", ""),
        ("u2", "Bob", "Eng", "Dev", "u1", ""),
        ("u1", "Alicia", "Eng", "Director", "", ""),
    ]);
    let people = PersonRepository::build(&t, &DepartmentFilter::All);
    assert_eq!(people.len(), 2);
    let u1 = people.get("u1").unwrap();
    assert_eq!(u1.full_name, "Alicia");
    assert_eq!(u1.title, "Director");
    // The key keeps its first position.
    assert_eq!(people.index_of("u1"), Some(0));
}

#[test]
fn build_is_idempotent() {
    let t = sample_table();
    let a = PersonRepository::build(&t, &DepartmentFilter::All);
    let b = PersonRepository::build(&t, &DepartmentFilter::All);
    assert_eq!(a, b);
}

#[test]
fn department_filter_is_exact_and_case_sensitive() {
    let t = table(&[
        ("u1", "Alice", "Eng", "Lead", "", ""),
        ("u2", "Bob", "eng", "Dev", "u1", ""),
        ("u3", "Cara", "Sales", "Rep", "", ""),
    ]);
    let people = PersonRepository::build(&t, &DepartmentFilter::Only("Eng".to_string()));
    assert_eq!(people.usernames().collect::<Vec<_>>(), vec!["u1"]);
}

#[test]
fn department_filter_parses_all_sentinels() {
    assert_eq!(DepartmentFilter::parse(""), DepartmentFilter::All);
    assert_eq!(DepartmentFilter::parse("ALL"), DepartmentFilter::All);
    assert_eq!(DepartmentFilter::parse("Tümü"), DepartmentFilter::All);
    assert_eq!(
        DepartmentFilter::parse(" Eng "),
        DepartmentFilter::Only("Eng".to_string())
    );
}

#[test]
fn select_people_rejects_empty_selection() {
    let err = select_people(&sample_table(), &DepartmentFilter::Only("Legal".to_string()))
        .unwrap_err();
    match err {
        Error::EmptySelection { department } => assert_eq!(department, "Legal"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn search_matches_username_or_name_in_repository_order() {
    let people = PersonRepository::build(&sample_table(), &DepartmentFilter::All);
    assert_eq!(people.search("CAR").map(|p| p.username.as_str()), Some("u3"));
    assert_eq!(people.search("u").map(|p| p.username.as_str()), Some("u1"));
    assert!(people.search("zed").is_none());
    assert!(people.search("  ").is_none());
}
