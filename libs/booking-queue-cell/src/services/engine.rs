use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentRequest, AppointmentStatus, AppointmentStore, NewAppointment,
    StatusSwap,
};
use doctor_cell::{DoctorRegistry, DoctorStatus};

use crate::error::QueueError;
use crate::models::{
    Advancement, BookingReceipt, DoctorStatusBroadcast, DoctorStatusChange, LiveStatus,
    QueueDelayUpdate, QueueEvent, QueuePositionUpdate, StatusChangeOutcome, TurnAlert,
    ON_BREAK_MESSAGE, TURN_ALERT_MESSAGE,
};
use crate::services::estimates::{booking_wait, live_wait, running_late_wait};
use crate::services::notifications::Notifier;

// Statuses only move forward, so a write can lose at most two races.
const MAX_STATUS_WRITE_ATTEMPTS: usize = 3;

pub fn doctor_status_note(status: DoctorStatus) -> &'static str {
    match status {
        DoctorStatus::RunningLate => {
            "Doctor is running late, wait time has increased by 10 minutes"
        }
        DoctorStatus::OnBreak => "Doctor is on a break, bookings temporarily paused",
        DoctorStatus::OnTime => "Doctor is on-time",
    }
}

/// The live queue state machine.
///
/// Owns the booking, consultation progress and doctor status rules. Storage and
/// the real-time transport are injected.
#[derive(Clone)]
pub struct QueueEngine {
    doctors: Arc<dyn DoctorRegistry>,
    appointments: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn Notifier>,
}

impl QueueEngine {
    pub fn new(
        doctors: Arc<dyn DoctorRegistry>,
        appointments: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            doctors,
            appointments,
            notifier,
        }
    }

    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id))]
    pub async fn book_appointment(
        &self,
        request: AppointmentRequest,
    ) -> Result<BookingReceipt, QueueError> {
        let doctor = self
            .doctors
            .get(&request.doctor_id)
            .await?
            .ok_or_else(|| QueueError::DoctorNotFound(request.doctor_id.clone()))?;

        if doctor.is_on_break() {
            info!("Rejected booking for doctor {} on break", doctor.id);
            return Err(QueueError::DoctorUnavailable(doctor.id));
        }

        let queue_number = self.appointments.count_waiting(&doctor.id).await? + 1;
        let estimated_wait_time =
            booking_wait(queue_number, doctor.average_consultation_time, doctor.status);

        let appointment = self
            .appointments
            .create(NewAppointment::from_request(request, queue_number))
            .await?;

        info!(
            "Booked appointment {} with doctor {} at queue number {}",
            appointment.id, doctor.id, queue_number
        );

        Ok(BookingReceipt {
            appointment,
            doctor_name: doctor.name,
            estimated_wait_time,
        })
    }

    /// Doctor-driven progress of a consultation.
    ///
    /// Completing an appointment promotes the earliest waiting patient of the
    /// same doctor and republishes every active position.
    #[instrument(skip(self))]
    pub async fn set_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<StatusChangeOutcome, QueueError> {
        if status == AppointmentStatus::Waiting {
            return Err(QueueError::UnsupportedTargetStatus(status));
        }

        let mut current = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(QueueError::AppointmentNotFound(appointment_id))?
            .status;

        let mut updated = None;
        for _ in 0..MAX_STATUS_WRITE_ATTEMPTS {
            if !current.can_transition_to(&status) {
                return Err(QueueError::InvalidStatusTransition {
                    from: current,
                    to: status,
                });
            }

            match self
                .appointments
                .compare_and_set_status(appointment_id, current, status)
                .await?
            {
                StatusSwap::Swapped(appointment) => {
                    updated = Some(appointment);
                    break;
                }
                StatusSwap::Conflict(actual) => {
                    debug!(
                        "Appointment {} moved to {} concurrently, rechecking",
                        appointment_id, actual
                    );
                    current = actual;
                }
                StatusSwap::NotFound => {
                    return Err(QueueError::AppointmentNotFound(appointment_id))
                }
            }
        }

        let appointment = updated.ok_or(QueueError::InvalidStatusTransition {
            from: current,
            to: status,
        })?;
        info!("Appointment {} is now {}", appointment.id, appointment.status);

        if status != AppointmentStatus::Done {
            return Ok(StatusChangeOutcome {
                appointment,
                next_patient: None,
                advancement: Advancement::NotRequested,
            });
        }

        let next_patient = self.advance_queue(&appointment.doctor_id).await?;
        let advancement = if next_patient.is_some() {
            Advancement::QueueMoved
        } else {
            Advancement::QueueEmpty
        };

        Ok(StatusChangeOutcome {
            appointment,
            next_patient,
            advancement,
        })
    }

    /// Promote the earliest waiting appointment of `doctor_id`, if any.
    ///
    /// The promotion is a compare-and-set from waiting, so concurrent callers
    /// never promote the same appointment twice; the loser moves on to the next
    /// waiting one. A lost swap means the candidate already left waiting, so
    /// the loop ends once nobody is waiting.
    #[instrument(skip(self))]
    pub async fn advance_queue(&self, doctor_id: &str) -> Result<Option<Appointment>, QueueError> {
        loop {
            let Some(candidate) = self.appointments.find_earliest_waiting(doctor_id).await? else {
                info!("No more patients waiting for doctor {}", doctor_id);
                return Ok(None);
            };

            match self
                .appointments
                .compare_and_set_status(
                    candidate.id,
                    AppointmentStatus::Waiting,
                    AppointmentStatus::InProgress,
                )
                .await?
            {
                StatusSwap::Swapped(promoted) => {
                    info!("Promoted appointment {} for doctor {}", promoted.id, doctor_id);

                    self.emit(
                        promoted.id,
                        QueueEvent::TurnAlert(TurnAlert {
                            message: TURN_ALERT_MESSAGE.to_string(),
                            appointment_id: promoted.id,
                        }),
                    )
                    .await;
                    self.publish_positions(doctor_id).await;

                    return Ok(Some(promoted));
                }
                StatusSwap::Conflict(_) | StatusSwap::NotFound => {
                    debug!("Lost promotion race for appointment {}", candidate.id);
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_live_status(&self, appointment_id: Uuid) -> Result<LiveStatus, QueueError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(QueueError::AppointmentNotFound(appointment_id))?;

        let doctor = self
            .doctors
            .get(&appointment.doctor_id)
            .await?
            .ok_or_else(|| QueueError::DoctorNotFound(appointment.doctor_id.clone()))?;

        if doctor.is_on_break() {
            return Ok(LiveStatus {
                appointment_id: appointment.id,
                patient_name: appointment.patient_name,
                doctor: doctor.name,
                status: appointment.status,
                queue_position: None,
                estimated_wait_time: None,
                doctor_status: doctor.status,
                message: Some(ON_BREAK_MESSAGE.to_string()),
            });
        }

        let queue_position = self
            .appointments
            .count_ahead_of(&doctor.id, appointment.created_at)
            .await?
            + 1;

        Ok(LiveStatus {
            appointment_id: appointment.id,
            patient_name: appointment.patient_name,
            doctor: doctor.name,
            status: appointment.status,
            queue_position: Some(queue_position),
            estimated_wait_time: Some(live_wait(queue_position, doctor.status)),
            doctor_status: doctor.status,
            message: None,
        })
    }

    #[instrument(skip(self))]
    pub async fn set_doctor_status(
        &self,
        doctor_id: &str,
        status: DoctorStatus,
    ) -> Result<DoctorStatusChange, QueueError> {
        let doctor = self
            .doctors
            .set_status(doctor_id, status)
            .await?
            .ok_or_else(|| QueueError::DoctorNotFound(doctor_id.to_string()))?;

        info!("Doctor {} is now {}", doctor.id, doctor.status);

        let notified_appointments = match status {
            DoctorStatus::RunningLate => self.publish_delays(&doctor.id, status).await,
            DoctorStatus::OnBreak | DoctorStatus::OnTime => 0,
        };

        let note = doctor_status_note(status).to_string();
        self.announce(QueueEvent::DoctorStatus(DoctorStatusBroadcast {
            doctor_id: doctor.id.clone(),
            status,
            note: note.clone(),
        }))
        .await;

        Ok(DoctorStatusChange {
            doctor,
            note,
            notified_appointments,
        })
    }

    /// Every appointment of the doctor in booking order. Unknown doctors have none.
    pub async fn appointments_for_doctor(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<Appointment>, QueueError> {
        Ok(self.appointments.list_by_doctor(doctor_id).await?)
    }

    async fn publish_positions(&self, doctor_id: &str) {
        let active = match self.appointments.list_active(doctor_id).await {
            Ok(active) => active,
            Err(e) => {
                error!("Failed to recompute queue positions for doctor {}: {}", doctor_id, e);
                return;
            }
        };

        for (index, appointment) in active.iter().enumerate() {
            let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
            self.emit(
                appointment.id,
                QueueEvent::PositionUpdate(QueuePositionUpdate {
                    position,
                    appointment_id: appointment.id,
                }),
            )
            .await;
        }
    }

    async fn publish_delays(&self, doctor_id: &str, doctor_status: DoctorStatus) -> usize {
        let active = match self.appointments.list_active(doctor_id).await {
            Ok(active) => active,
            Err(e) => {
                error!("Failed to recompute wait times for doctor {}: {}", doctor_id, e);
                return 0;
            }
        };

        for (rank, appointment) in active.iter().enumerate() {
            self.emit(
                appointment.id,
                QueueEvent::DelayUpdate(QueueDelayUpdate {
                    appointment_id: appointment.id,
                    new_wait_time: running_late_wait(rank),
                    doctor_status,
                }),
            )
            .await;
        }
        active.len()
    }

    async fn emit(&self, appointment_id: Uuid, event: QueueEvent) {
        let Some(payload) = Self::payload(&event) else {
            return;
        };

        if let Err(e) = self
            .notifier
            .publish(&appointment_id.to_string(), event.name(), payload)
            .await
        {
            warn!(
                "Failed to deliver {} to appointment {}: {}",
                event.name(),
                appointment_id,
                e
            );
        }
    }

    async fn announce(&self, event: QueueEvent) {
        let Some(payload) = Self::payload(&event) else {
            return;
        };

        if let Err(e) = self.notifier.broadcast(event.name(), payload).await {
            warn!("Failed to broadcast {}: {}", event.name(), e);
        }
    }

    fn payload(event: &QueueEvent) -> Option<Value> {
        match serde_json::to_value(event) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Failed to serialize {} event: {}", event.name(), e);
                None
            }
        }
    }
}
