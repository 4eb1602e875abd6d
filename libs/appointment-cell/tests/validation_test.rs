use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use appointment_cell::*;

#[test]
fn test_valid_request_is_accepted() {
    let now = Utc::now();
    let scheduled = now + Duration::hours(2);

    let request = validate_new_appointment(
        &json!({
            "patientName": "  Akosua Addo ",
            "doctorId": "doc-1",
            "scheduledTime": scheduled.to_rfc3339(),
        }),
        now,
    )
    .unwrap();

    assert_eq!(request.patient_name, "Akosua Addo");
    assert_eq!(request.doctor_id, "doc-1");
    assert_eq!(request.scheduled_time, scheduled);
}

#[test]
fn test_unknown_fields_are_dropped() {
    let now = Utc::now();
    let result = validate_new_appointment(
        &json!({
            "patientName": "Akosua Addo",
            "doctorId": "doc-1",
            "scheduledTime": (now + Duration::minutes(5)).to_rfc3339(),
            "queueNumber": 1,
            "status": "done",
        }),
        now,
    );

    assert!(result.is_ok());
}

#[test]
fn test_all_violations_are_reported_together() {
    let now = Utc::now();
    let errors = validate_new_appointment(&json!({ "patientName": "" }), now).unwrap_err();

    assert_eq!(
        errors.issues(),
        &[
            ValidationIssue::Empty { field: "patientName" },
            ValidationIssue::Missing { field: "doctorId" },
            ValidationIssue::Missing { field: "scheduledTime" },
        ]
    );
    assert_eq!(
        errors.messages(),
        vec![
            "Patient name is required".to_string(),
            "\"doctorId\" is required".to_string(),
            "Scheduled time is required".to_string(),
        ]
    );
}

#[test]
fn test_past_and_invalid_dates() {
    let now = Utc::now();

    let past = validate_new_appointment(
        &json!({
            "patientName": "Kwame",
            "doctorId": "doc-1",
            "scheduledTime": (now - Duration::minutes(1)).to_rfc3339(),
        }),
        now,
    )
    .unwrap_err();
    assert_eq!(past.issues(), &[ValidationIssue::InPast { field: "scheduledTime" }]);

    let garbage = validate_new_appointment(
        &json!({
            "patientName": "Kwame",
            "doctorId": "doc-1",
            "scheduledTime": "next tuesday",
        }),
        now,
    )
    .unwrap_err();
    assert_eq!(
        garbage.to_string(),
        "Scheduled time must be a valid date"
    );
}

#[test]
fn test_alternative_date_forms() {
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap();
    let expected = Utc.with_ymd_and_hms(2030, 1, 1, 9, 30, 0).unwrap();

    let naive = validate_new_appointment(
        &json!({
            "patientName": "Kwame",
            "doctorId": "doc-1",
            "scheduledTime": "2030-01-01T09:30:00",
        }),
        now,
    )
    .unwrap();
    assert_eq!(naive.scheduled_time, expected);

    let millis = validate_new_appointment(
        &json!({
            "patientName": "Kwame",
            "doctorId": "doc-1",
            "scheduledTime": expected.timestamp_millis(),
        }),
        now,
    )
    .unwrap();
    assert_eq!(millis.scheduled_time, expected);
}

#[test]
fn test_bare_date_means_midnight_utc() {
    let now = Utc.with_ymd_and_hms(2030, 10, 18, 15, 0, 0).unwrap();
    let request = |date: &str| {
        json!({
            "patientName": "Kwame",
            "doctorId": "doc-1",
            "scheduledTime": date,
        })
    };

    let upcoming = validate_new_appointment(&request("2030-10-20"), now).unwrap();
    assert_eq!(
        upcoming.scheduled_time,
        Utc.with_ymd_and_hms(2030, 10, 20, 0, 0, 0).unwrap()
    );

    // Midnight of the current day has already passed.
    let today = validate_new_appointment(&request("2030-10-18"), now).unwrap_err();
    assert_eq!(today.issues(), &[ValidationIssue::InPast { field: "scheduledTime" }]);

    let impossible = validate_new_appointment(&request("2030-02-30"), now).unwrap_err();
    assert_eq!(
        impossible.issues(),
        &[ValidationIssue::InvalidDate { field: "scheduledTime" }]
    );
}

#[test]
fn test_scheduled_time_equal_to_now_is_allowed() {
    let now = Utc::now();
    let result = validate_new_appointment(
        &json!({
            "patientName": "Kwame",
            "doctorId": "doc-1",
            "scheduledTime": now.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
        }),
        now,
    );
    assert!(result.is_ok());
}

#[test]
fn test_wrong_types_and_non_object_bodies() {
    let now = Utc::now();

    let errors = validate_new_appointment(
        &json!({
            "patientName": 42,
            "doctorId": ["doc-1"],
            "scheduledTime": true,
        }),
        now,
    )
    .unwrap_err();
    assert_eq!(errors.issues().len(), 3);
    assert!(matches!(
        errors.issues()[0],
        ValidationIssue::WrongType { field: "patientName", .. }
    ));

    let not_object = validate_new_appointment(&json!("hello"), now).unwrap_err();
    assert_eq!(not_object.issues(), &[ValidationIssue::NotAnObject]);
}
