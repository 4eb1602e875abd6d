// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_name: String,
    pub doctor_id: String,
    pub scheduled_time: DateTime<Utc>,
    /// Booking-order label fixed at creation. Live position is computed from
    /// `created_at` instead.
    pub queue_number: u32,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Waiting,
    InProgress,
    Done,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Waiting => "waiting",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Done => "done",
        }
    }

    /// Waiting or in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Waiting | AppointmentStatus::InProgress)
    }

    /// Progression is monotonic. Going straight from waiting to done is
    /// tolerated (a doctor closing out a patient who never got called), and
    /// re-marking in-progress is an idempotent write.
    pub fn can_transition_to(&self, target: &AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        match (self, target) {
            (Waiting, InProgress) => true,
            (Waiting, Done) => true,
            (InProgress, InProgress) => true,
            (InProgress, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(AppointmentStatus::Waiting),
            "in-progress" => Ok(AppointmentStatus::InProgress),
            "done" => Ok(AppointmentStatus::Done),
            other => Err(format!(
                "Invalid appointment status '{}', expected one of waiting, in-progress, done",
                other
            )),
        }
    }
}

// ==============================================================================
// REQUEST / WRITE MODELS
// ==============================================================================

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRequest {
    pub patient_name: String,
    pub doctor_id: String,
    pub scheduled_time: DateTime<Utc>,
}

/// Everything the store needs to persist a new appointment. The store assigns
/// the id and the timestamps; status always starts as waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub patient_name: String,
    pub doctor_id: String,
    pub scheduled_time: DateTime<Utc>,
    pub queue_number: u32,
}

impl NewAppointment {
    pub fn from_request(request: AppointmentRequest, queue_number: u32) -> Self {
        Self {
            patient_name: request.patient_name,
            doctor_id: request.doctor_id,
            scheduled_time: request.scheduled_time,
            queue_number,
        }
    }
}

/// Outcome of a conditional status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSwap {
    Swapped(Appointment),
    /// The record was not in the expected status; carries the status it had.
    Conflict(AppointmentStatus),
    NotFound,
}
