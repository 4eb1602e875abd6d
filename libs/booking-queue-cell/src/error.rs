use thiserror::Error;
use uuid::Uuid;

use appointment_cell::{AppointmentStatus, ValidationErrors};
use shared_database::StoreError;
use shared_models::AppError;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(Uuid),

    #[error("Doctor {0} is currently on a break. Please try again later.")]
    DoctorUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Appointments cannot be set to {0}")]
    UnsupportedTargetStatus(AppointmentStatus),

    #[error("Invalid appointment status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl From<QueueError> for AppError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::DoctorNotFound(_) => AppError::NotFound("Doctor not found".to_string()),
            QueueError::AppointmentNotFound(_) => {
                AppError::NotFound("Appointment not found".to_string())
            }
            QueueError::DoctorUnavailable(_) => AppError::BadRequest(
                "Doctor is currently on a break. Please try again later.".to_string(),
            ),
            QueueError::ValidationError(errors) => AppError::ValidationError(errors.messages()),
            QueueError::UnsupportedTargetStatus(_) => {
                AppError::ValidationError(vec![e.to_string()])
            }
            QueueError::InvalidStatusTransition { .. } => AppError::Conflict(e.to_string()),
            QueueError::StoreError(inner) => AppError::Internal(inner.to_string()),
        }
    }
}
