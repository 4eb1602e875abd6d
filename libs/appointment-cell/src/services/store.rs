// libs/appointment-cell/src/services/store.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_database::StoreError;

use crate::models::{Appointment, AppointmentStatus, NewAppointment, StatusSwap};

/// Narrow a record count to the API width, saturating instead of wrapping.
pub(crate) fn saturating_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Repository of appointment records.
///
/// Every "ordered" result is ascending by `created_at`, which is the queue
/// ordering key.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Persist a new appointment in the waiting state.
    async fn create(&self, new: NewAppointment) -> Result<Appointment, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn count_waiting(&self, doctor_id: &str) -> Result<u32, StoreError>;

    async fn find_earliest_waiting(&self, doctor_id: &str)
        -> Result<Option<Appointment>, StoreError>;

    /// Waiting and in-progress appointments, ordered.
    async fn list_active(&self, doctor_id: &str) -> Result<Vec<Appointment>, StoreError>;

    /// Every appointment of the doctor regardless of status, ordered.
    async fn list_by_doctor(&self, doctor_id: &str) -> Result<Vec<Appointment>, StoreError>;

    /// Active appointments created strictly before `created_at`.
    async fn count_ahead_of(
        &self,
        doctor_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<u32, StoreError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Write `status` only if the record is still in `expected`. The check and
    /// the write are atomic.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<StatusSwap, StoreError>;
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

#[derive(Debug, Default)]
struct StoreState {
    appointments: HashMap<Uuid, Appointment>,
    last_created_at: Option<DateTime<Utc>>,
}

impl StoreState {
    // created_at is strictly increasing, so it totally orders bookings even
    // when two land within the clock's resolution.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(created_at);
        created_at
    }

    fn for_doctor<F>(&self, doctor_id: &str, predicate: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id && predicate(*a))
            .cloned()
            .collect();
        appointments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        appointments
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAppointmentStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.appointments.len()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn create(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let mut state = self.state.write().await;
        let created_at = state.next_created_at();

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_name: new.patient_name,
            doctor_id: new.doctor_id,
            scheduled_time: new.scheduled_time,
            queue_number: new.queue_number,
            status: AppointmentStatus::Waiting,
            created_at,
            updated_at: created_at,
        };

        state.appointments.insert(appointment.id, appointment.clone());
        debug!(
            "Created appointment {} for doctor {} with queue number {}",
            appointment.id, appointment.doctor_id, appointment.queue_number
        );

        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn count_waiting(&self, doctor_id: &str) -> Result<u32, StoreError> {
        let state = self.state.read().await;
        let count = state
            .appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.status == AppointmentStatus::Waiting)
            .count();
        Ok(saturating_count(count))
    }

    async fn find_earliest_waiting(
        &self,
        doctor_id: &str,
    ) -> Result<Option<Appointment>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .for_doctor(doctor_id, |a| a.status == AppointmentStatus::Waiting)
            .into_iter()
            .next())
    }

    async fn list_active(&self, doctor_id: &str) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.state.read().await.for_doctor(doctor_id, Appointment::is_active))
    }

    async fn list_by_doctor(&self, doctor_id: &str) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.state.read().await.for_doctor(doctor_id, |_| true))
    }

    async fn count_ahead_of(
        &self,
        doctor_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let state = self.state.read().await;
        let count = state
            .appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.is_active() && a.created_at < created_at)
            .count();
        Ok(saturating_count(count))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut state = self.state.write().await;

        Ok(state.appointments.get_mut(&id).map(|appointment| {
            appointment.status = status;
            appointment.updated_at = Utc::now();
            appointment.clone()
        }))
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<StatusSwap, StoreError> {
        let mut state = self.state.write().await;

        let Some(appointment) = state.appointments.get_mut(&id) else {
            return Ok(StatusSwap::NotFound);
        };

        if appointment.status != expected {
            debug!(
                "Conditional write on {} lost: expected {}, found {}",
                id, expected, appointment.status
            );
            return Ok(StatusSwap::Conflict(appointment.status));
        }

        appointment.status = status;
        appointment.updated_at = Utc::now();
        Ok(StatusSwap::Swapped(appointment.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_that_fit_are_unchanged() {
        assert_eq!(saturating_count(0), 0);
        assert_eq!(saturating_count(42), 42);
        assert_eq!(saturating_count(u32::MAX as usize), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_counts_saturate() {
        assert_eq!(saturating_count(u32::MAX as usize + 1), u32::MAX);
        assert_eq!(saturating_count(usize::MAX), u32::MAX);
    }
}
