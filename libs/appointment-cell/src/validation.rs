// libs/appointment-cell/src/validation.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::models::AppointmentRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NotAnObject,
    Missing { field: &'static str },
    WrongType { field: &'static str, expected: &'static str },
    Empty { field: &'static str },
    InvalidDate { field: &'static str },
    InPast { field: &'static str },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NotAnObject => write!(f, "Request body must be a JSON object"),
            ValidationIssue::Missing { field: "scheduledTime" } => {
                write!(f, "Scheduled time is required")
            }
            ValidationIssue::Missing { field } => write!(f, "\"{}\" is required", field),
            ValidationIssue::WrongType { field, expected } => {
                write!(f, "\"{}\" must be a {}", field, expected)
            }
            ValidationIssue::Empty { field: "patientName" } => {
                write!(f, "Patient name is required")
            }
            ValidationIssue::Empty { field } => write!(f, "\"{}\" is not allowed to be empty", field),
            ValidationIssue::InvalidDate { .. } => write!(f, "Scheduled time must be a valid date"),
            ValidationIssue::InPast { .. } => {
                write!(f, "Scheduled time must be today or a future date")
            }
        }
    }
}

/// Every problem found in a request, in field order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_issues(.issues))]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a raw booking body against the creation contract.
///
/// Unknown fields are ignored. Validation does not stop at the first problem:
/// the error lists every violation.
pub fn validate_new_appointment(
    body: &Value,
    now: DateTime<Utc>,
) -> Result<AppointmentRequest, ValidationErrors> {
    let Some(fields) = body.as_object() else {
        return Err(ValidationErrors {
            issues: vec![ValidationIssue::NotAnObject],
        });
    };

    let mut issues = Vec::new();

    let patient_name = required_string(fields.get("patientName"), "patientName", &mut issues);
    let doctor_id = required_string(fields.get("doctorId"), "doctorId", &mut issues);
    let scheduled_time = match fields.get("scheduledTime") {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::Missing { field: "scheduledTime" });
            None
        }
        Some(raw) => match parse_timestamp(raw) {
            None => {
                issues.push(ValidationIssue::InvalidDate { field: "scheduledTime" });
                None
            }
            Some(time) if time < now => {
                issues.push(ValidationIssue::InPast { field: "scheduledTime" });
                None
            }
            Some(time) => Some(time),
        },
    };

    match (patient_name, doctor_id, scheduled_time) {
        (Some(patient_name), Some(doctor_id), Some(scheduled_time)) if issues.is_empty() => {
            Ok(AppointmentRequest {
                patient_name,
                doctor_id,
                scheduled_time,
            })
        }
        _ => Err(ValidationErrors { issues }),
    }
}

fn required_string(
    value: Option<&Value>,
    field: &'static str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match value {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::Missing { field });
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            issues.push(ValidationIssue::Empty { field });
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            issues.push(ValidationIssue::WrongType {
                field,
                expected: "string",
            });
            None
        }
    }
}

/// RFC 3339, a zone-less ISO datetime (read as UTC), a bare date (midnight
/// UTC), or epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|naive| naive.and_utc())
                })
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .map(|naive| naive.and_utc())
                })
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
