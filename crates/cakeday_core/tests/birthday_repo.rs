use cakeday_core::db::open_db_in_memory;
use cakeday_core::{
    BirthdayRecord, BirthdayStore, BirthdayValidationError, RepoError, SqliteBirthdayRepository,
    UpsertRequest,
};
use serde_json::json;

#[test]
fn insert_assigns_id_and_lists_sorted_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBirthdayRepository::new(&conn);

    let grace = repo
        .upsert_birthday(&UpsertRequest::new(None, "grace Hopper", "1906-12-09", None, None))
        .unwrap();
    let ada = repo
        .upsert_birthday(&UpsertRequest::new(
            None,
            "Ada Lovelace",
            "0000-12-10",
            Some("friend".to_string()),
            None,
        ))
        .unwrap();
    assert_ne!(grace, ada);

    let listed = repo.list_birthdays().unwrap();
    let names = listed.iter().map(|record| record.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Ada Lovelace", "grace Hopper"]);
    assert_eq!(listed[0].relationship.as_deref(), Some("friend"));
    assert_eq!(listed[0].date, "0000-12-10");
}

#[test]
fn insert_records_birth_year_only_when_known() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBirthdayRepository::new(&conn);

    let known = repo
        .upsert_birthday(&UpsertRequest::new(None, "Known", "1990-06-20", None, None))
        .unwrap();
    let unknown = repo
        .upsert_birthday(&UpsertRequest::new(None, "Unknown", "0000-06-20", None, None))
        .unwrap();

    assert_eq!(stored_birth_year(&conn, &known), Some(1990));
    assert_eq!(stored_birth_year(&conn, &unknown), None);
}

#[test]
fn update_overwrites_fields_and_keeps_extra() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBirthdayRepository::new(&conn);

    let mut record = BirthdayRecord::new("b-1", "John Smith", "1990-06-20");
    record.extra.insert("photo".to_string(), json!("file://john.png"));
    repo.create_birthday(&record).unwrap();

    let id = repo
        .upsert_birthday(&UpsertRequest::new(
            Some("b-1".to_string()),
            "  John A. Smith ",
            "1990-06-21",
            None,
            Some("met at work".to_string()),
        ))
        .unwrap();
    assert_eq!(id, "b-1");

    let loaded = repo.get_birthday("b-1").unwrap().unwrap();
    assert_eq!(loaded.name, "John A. Smith");
    assert_eq!(loaded.date, "1990-06-21");
    assert_eq!(loaded.notes.as_deref(), Some("met at work"));
    assert_eq!(loaded.extra.get("photo"), Some(&json!("file://john.png")));
    assert_eq!(repo.list_birthdays().unwrap().len(), 1);
}

#[test]
fn update_of_missing_record_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBirthdayRepository::new(&conn);

    let err = repo
        .upsert_birthday(&UpsertRequest::new(
            Some("gone".to_string()),
            "Ghost",
            "1990-01-01",
            None,
            None,
        ))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == "gone"));
}

#[test]
fn writes_reject_invalid_requests() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBirthdayRepository::new(&conn);

    let blank = repo
        .upsert_birthday(&UpsertRequest::new(None, "   ", "1990-01-01", None, None))
        .unwrap_err();
    assert!(matches!(
        blank,
        RepoError::Validation(BirthdayValidationError::EmptyName)
    ));

    let loose = repo
        .upsert_birthday(&UpsertRequest::new(None, "Ada", "June 20", None, None))
        .unwrap_err();
    assert!(matches!(
        loose,
        RepoError::Validation(BirthdayValidationError::NonCanonicalDate(_))
    ));
    assert!(repo.list_birthdays().unwrap().is_empty());
}

#[test]
fn create_requires_an_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBirthdayRepository::new(&conn);

    let err = repo
        .create_birthday(&BirthdayRecord::new(" ", "Ada", "1815-12-10"))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn corrupt_rows_surface_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO birthdays (id, name, date, extra_json) VALUES ('b-x', 'X', '1990-13-01', '{}');",
        [],
    )
    .unwrap();
    let repo = SqliteBirthdayRepository::new(&conn);

    let err = repo.list_birthdays().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    // Surfaces in logs; identifies the row without echoing its contents.
    let message = err.to_string();
    assert!(message.contains("b-x"));
    assert!(!message.contains("1990-13-01"));
}

#[test]
fn get_missing_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBirthdayRepository::new(&conn);
    assert!(repo.get_birthday("nope").unwrap().is_none());
}

fn stored_birth_year(conn: &rusqlite::Connection, id: &str) -> Option<i32> {
    conn.query_row(
        "SELECT birth_year FROM birthdays WHERE id = ?1;",
        [id],
        |row| row.get(0),
    )
    .unwrap()
}
