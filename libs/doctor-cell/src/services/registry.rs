use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use shared_database::StoreError;

use crate::models::{Doctor, DoctorStatus};

/// Lookup and availability state for doctors.
///
/// `set_status` only records the new state. Recalculating queues and notifying
/// patients is the caller's job.
#[async_trait]
pub trait DoctorRegistry: Send + Sync {
    async fn get(&self, doctor_id: &str) -> Result<Option<Doctor>, StoreError>;

    async fn set_status(
        &self,
        doctor_id: &str,
        status: DoctorStatus,
    ) -> Result<Option<Doctor>, StoreError>;

    /// Insert or replace a doctor record.
    async fn register(&self, doctor: Doctor) -> Result<Doctor, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDoctorRegistry {
    doctors: Arc<RwLock<HashMap<String, Doctor>>>,
}

impl InMemoryDoctorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.doctors.read().await.len()
    }
}

#[async_trait]
impl DoctorRegistry for InMemoryDoctorRegistry {
    async fn get(&self, doctor_id: &str) -> Result<Option<Doctor>, StoreError> {
        let doctors = self.doctors.read().await;
        Ok(doctors.get(doctor_id).cloned())
    }

    async fn set_status(
        &self,
        doctor_id: &str,
        status: DoctorStatus,
    ) -> Result<Option<Doctor>, StoreError> {
        let mut doctors = self.doctors.write().await;

        Ok(doctors.get_mut(doctor_id).map(|doctor| {
            debug!("Doctor {} status {} -> {}", doctor_id, doctor.status, status);
            doctor.status = status;
            doctor.clone()
        }))
    }

    async fn register(&self, doctor: Doctor) -> Result<Doctor, StoreError> {
        let mut doctors = self.doctors.write().await;
        doctors.insert(doctor.id.clone(), doctor.clone());
        debug!("Registered doctor {}", doctor.id);
        Ok(doctor)
    }
}
