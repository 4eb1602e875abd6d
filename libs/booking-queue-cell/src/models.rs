use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use appointment_cell::{Appointment, AppointmentStatus};
use doctor_cell::{Doctor, DoctorStatus};

pub const TURN_ALERT_EVENT: &str = "turnAlert";
pub const QUEUE_UPDATE_EVENT: &str = "queueUpdate";
pub const DOCTOR_STATUS_EVENT: &str = "doctorStatusUpdate";

pub const TURN_ALERT_MESSAGE: &str = "It's your turn!";
pub const ON_BREAK_MESSAGE: &str = "Doctor is currently on a break";

/// A wait-time estimate as shown to patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitEstimate {
    AvailableNow,
    Minutes(u32),
}

impl WaitEstimate {
    pub fn minutes(&self) -> u32 {
        match self {
            WaitEstimate::AvailableNow => 0,
            WaitEstimate::Minutes(minutes) => *minutes,
        }
    }
}

impl fmt::Display for WaitEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitEstimate::AvailableNow => write!(f, "Available now"),
            WaitEstimate::Minutes(minutes) => write!(f, "{} minutes", minutes),
        }
    }
}

impl Serialize for WaitEstimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ==============================================================================
// OPERATION RESULTS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingReceipt {
    pub appointment: Appointment,
    pub doctor_name: String,
    pub estimated_wait_time: WaitEstimate,
}

impl BookingReceipt {
    pub fn summary(&self) -> AppointmentSummary {
        AppointmentSummary {
            id: self.appointment.id,
            patient_name: self.appointment.patient_name.clone(),
            doctor: self.doctor_name.clone(),
            queue_number: self.appointment.queue_number,
            status: self.appointment.status,
            scheduled_time: self.appointment.scheduled_time,
            estimated_wait_time: self.estimated_wait_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSummary {
    pub id: Uuid,
    pub patient_name: String,
    pub doctor: String,
    pub queue_number: u32,
    pub status: AppointmentStatus,
    pub scheduled_time: DateTime<Utc>,
    pub estimated_wait_time: WaitEstimate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advancement {
    /// The update did not complete a consultation.
    NotRequested,
    QueueMoved,
    QueueEmpty,
}

#[derive(Debug, Clone)]
pub struct StatusChangeOutcome {
    pub appointment: Appointment,
    pub next_patient: Option<Appointment>,
    pub advancement: Advancement,
}

impl StatusChangeOutcome {
    pub fn message(&self) -> &'static str {
        match self.advancement {
            Advancement::NotRequested => "Appointment status updated",
            Advancement::QueueMoved => "Appointment marked done. Queue moved.",
            Advancement::QueueEmpty => "Appointment marked done. No more patients in queue.",
        }
    }
}

/// Where a patient stands right now.
///
/// Position and wait are `None` while the doctor is on a break.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub doctor: String,
    pub status: AppointmentStatus,
    pub queue_position: Option<u32>,
    pub estimated_wait_time: Option<WaitEstimate>,
    pub doctor_status: DoctorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DoctorStatusChange {
    pub doctor: Doctor,
    pub note: String,
    /// Appointments that received a recalculated wait.
    pub notified_appointments: usize,
}

// ==============================================================================
// NOTIFICATION EVENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TurnAlert {
    pub message: String,
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuePositionUpdate {
    pub position: u32,
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueueDelayUpdate {
    pub appointment_id: Uuid,
    pub new_wait_time: WaitEstimate,
    pub doctor_status: DoctorStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorStatusBroadcast {
    pub doctor_id: String,
    pub status: DoctorStatus,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum QueueEvent {
    TurnAlert(TurnAlert),
    PositionUpdate(QueuePositionUpdate),
    DelayUpdate(QueueDelayUpdate),
    DoctorStatus(DoctorStatusBroadcast),
}

impl QueueEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::TurnAlert(_) => TURN_ALERT_EVENT,
            QueueEvent::PositionUpdate(_) | QueueEvent::DelayUpdate(_) => QUEUE_UPDATE_EVENT,
            QueueEvent::DoctorStatus(_) => DOCTOR_STATUS_EVENT,
        }
    }
}
