//! Tests for the domain user model.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[fixture]
fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn record(created_at: DateTime<Utc>) -> UserRecord {
    let profile = User::new(
        UserId::new(VALID_ID).expect("valid id"),
        Username::new("supercoolname").expect("valid username"),
        Role::User,
        created_at,
    )
    .with_email(Some("cool@example.com".to_owned()));
    UserRecord {
        profile,
        password_hash: "$argon2id$v=19$hash".to_owned(),
        salt: "c2FsdA".to_owned(),
    }
}

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn user_id_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw).expect_err("invalid id"), expected);
}

#[rstest]
#[case("", UserValidationError::EmptyUsername)]
#[case("   ", UserValidationError::EmptyUsername)]
#[case("ab", UserValidationError::UsernameTooShort { min: USERNAME_MIN })]
#[case("bad$char", UserValidationError::UsernameInvalidCharacters)]
#[case("two words", UserValidationError::UsernameInvalidCharacters)]
fn username_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Username::new(raw).expect_err("invalid username"), expected);
}

#[rstest]
fn username_rejects_overlong_input() {
    let raw = "a".repeat(USERNAME_MAX + 1);
    assert_eq!(
        Username::new(raw).expect_err("too long"),
        UserValidationError::UsernameTooLong { max: USERNAME_MAX }
    );
}

#[rstest]
fn username_is_trimmed() {
    let username = Username::new("  ada.l  ").expect("valid username");
    assert_eq!(username.as_ref(), "ada.l");
}

#[rstest]
fn serialised_profile_never_contains_secrets(record: UserRecord) {
    let value = serde_json::to_value(record.into_profile()).expect("profile serialises");
    let object = value.as_object().expect("object");
    assert!(!object.contains_key("password"));
    assert!(!object.contains_key("passwordHash"));
    assert!(!object.contains_key("salt"));
    assert_eq!(object.get("username"), Some(&json!("supercoolname")));
    assert_eq!(object.get("role"), Some(&json!("user")));
    assert!(object.get("createdAt").is_some_and(Value::is_string));
}

#[rstest]
fn profile_rejects_unknown_secret_fields() {
    let payload = json!({
        "id": VALID_ID,
        "username": "supercoolname",
        "role": "user",
        "createdAt": "2024-01-01T12:00:00Z",
        "updatedAt": "2024-01-01T12:00:00Z",
        "salt": "x"
    });
    assert!(serde_json::from_value::<User>(payload).is_err());
}

#[rstest]
fn record_debug_redacts_secrets(record: UserRecord) {
    let rendered = format!("{record:?}");
    assert!(!rendered.contains("argon2id"));
    assert!(!rendered.contains("c2FsdA"));
}

#[rstest]
#[case("name", "", None, UserValidationError::EmptyPassword)]
#[case("name", "pw", Some("no-at-sign"), UserValidationError::InvalidEmail)]
#[case("name", "pw", Some("@example.com"), UserValidationError::InvalidEmail)]
fn new_user_validates_parts(
    #[case] username: &str,
    #[case] password: &str,
    #[case] email: Option<&str>,
    #[case] expected: UserValidationError,
) {
    let err = NewUser::try_from_parts(username, password, email, None).expect_err("invalid");
    assert_eq!(err, expected);
}

#[rstest]
fn patch_updates_profile_fields(mut record: UserRecord, created_at: DateTime<Utc>) {
    let later = created_at + chrono::Duration::minutes(5);
    let patch = UserPatch::try_from_parts(Some("updatedcoolname"), None, None, Some(" Ada "))
        .expect("valid patch");
    record.profile.apply_patch(&patch, later);

    assert_eq!(record.profile.username().as_ref(), "updatedcoolname");
    assert_eq!(record.profile.name(), Some("Ada"));
    assert_eq!(record.profile.email(), Some("cool@example.com"));
    assert_eq!(record.profile.created_at(), created_at);
    assert_eq!(record.profile.updated_at(), later);
}

#[rstest]
#[case(None)]
#[case(Some(""))]
#[case(Some("   "))]
fn blank_names_leave_patch_empty(#[case] name: Option<&str>) {
    let patch = UserPatch::try_from_parts(None, None, None, name).expect("valid patch");
    assert!(patch.is_empty());
    assert!(patch.name.is_none());
}

#[rstest]
fn blank_name_matches_between_create_and_patch() {
    let created = NewUser::try_from_parts("supercoolname", "pw", None, Some("  ")).expect("valid");
    let patch = UserPatch::try_from_parts(None, None, None, Some("  ")).expect("valid patch");
    assert_eq!(created.name(), None);
    assert_eq!(patch.name.as_deref(), created.name());
}

#[rstest]
fn patch_debug_redacts_password() {
    let debug = format!(
        "{:?}",
        UserPatch::try_from_parts(None, Some("hunter2"), None, None).expect("valid patch")
    );
    assert!(!debug.contains("hunter2"));
}
