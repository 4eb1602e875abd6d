#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use appointment_cell::{AppointmentRequest, InMemoryAppointmentStore};
use booking_queue_cell::{NotificationError, Notifier, QueueEngine};
use doctor_cell::{Doctor, DoctorRegistry, DoctorStatus, InMemoryDoctorRegistry};

pub const DOCTOR_ID: &str = "doc-mensah";
pub const SECOND_DOCTOR_ID: &str = "doc-owusu";

/// A message the engine handed to the notifier. `channel` is `None` for
/// global broadcasts.
#[derive(Debug, Clone)]
pub struct Published {
    pub channel: Option<String>,
    pub event: String,
    pub payload: Value,
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    published: Arc<Mutex<Vec<Published>>>,
}

impl RecordingNotifier {
    pub async fn all(&self) -> Vec<Published> {
        self.published.lock().await.clone()
    }

    pub async fn events(&self, event: &str) -> Vec<Published> {
        self.all()
            .await
            .into_iter()
            .filter(|p| p.event == event)
            .collect()
    }

    pub async fn clear(&self) {
        self.published.lock().await.clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: Value,
    ) -> Result<(), NotificationError> {
        self.published.lock().await.push(Published {
            channel: Some(channel.to_string()),
            event: event.to_string(),
            payload,
        });
        Ok(())
    }

    async fn broadcast(&self, event: &str, payload: Value) -> Result<(), NotificationError> {
        self.published.lock().await.push(Published {
            channel: None,
            event: event.to_string(),
            payload,
        });
        Ok(())
    }
}

pub struct TestClinic {
    pub engine: QueueEngine,
    pub doctors: InMemoryDoctorRegistry,
    pub appointments: InMemoryAppointmentStore,
    pub notifier: RecordingNotifier,
}

/// Two on-time doctors: Dr. Mensah (20 minute consultations) and Dr. Owusu (15).
pub async fn setup_clinic() -> TestClinic {
    let doctors = InMemoryDoctorRegistry::new();
    doctors
        .register(Doctor::new(DOCTOR_ID, "Dr. Mensah").with_specialisation("General Practice"))
        .await
        .unwrap();
    doctors
        .register(
            Doctor::new(SECOND_DOCTOR_ID, "Dr. Owusu")
                .with_average_consultation_time(NonZeroU32::new(15).unwrap()),
        )
        .await
        .unwrap();

    let appointments = InMemoryAppointmentStore::new();
    let notifier = RecordingNotifier::default();

    let engine = QueueEngine::new(
        Arc::new(doctors.clone()),
        Arc::new(appointments.clone()),
        Arc::new(notifier.clone()),
    );

    TestClinic {
        engine,
        doctors,
        appointments,
        notifier,
    }
}

pub fn booking_request(patient: &str, doctor_id: &str) -> AppointmentRequest {
    AppointmentRequest {
        patient_name: patient.to_string(),
        doctor_id: doctor_id.to_string(),
        scheduled_time: Utc::now() + Duration::hours(2),
    }
}

pub async fn set_doctor_status_directly(clinic: &TestClinic, doctor_id: &str, status: DoctorStatus) {
    clinic.doctors.set_status(doctor_id, status).await.unwrap();
}
