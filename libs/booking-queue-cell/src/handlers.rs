use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::{Json, Response},
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use appointment_cell::{validate_new_appointment, AppointmentStatus};
use doctor_cell::DoctorStatus;
use shared_models::error::AppError;

use crate::error::QueueError;
use crate::services::{engine::QueueEngine, notifications::NotificationHub};
use crate::socket::serve_subscriber;

#[derive(Clone)]
pub struct QueueState {
    pub engine: Arc<QueueEngine>,
    pub hub: NotificationHub,
}

impl QueueState {
    pub fn new(engine: QueueEngine, hub: NotificationHub) -> Self {
        Self {
            engine: Arc::new(engine),
            hub,
        }
    }
}

/// Book a patient into a doctor's queue
pub async fn create_appointment(
    State(state): State<QueueState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(body) = body.map_err(|rejection| AppError::ValidationError(vec![rejection.body_text()]))?;

    let request = validate_new_appointment(&body, Utc::now()).map_err(QueueError::from)?;

    let receipt = state
        .engine
        .book_appointment(request)
        .await
        .map_err(|e| match e {
            QueueError::DoctorNotFound(_) => AppError::BadRequest("Doctor doesn't exist".to_string()),
            other => AppError::from(other),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment created successfully",
            "appointment": receipt.summary(),
        })),
    ))
}

/// Doctor marks an appointment in-progress or done
pub async fn update_appointment_status(
    State(state): State<QueueState>,
    Path(appointment_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_appointment_id(&appointment_id)?;
    let Json(body) = body.map_err(|rejection| AppError::ValidationError(vec![rejection.body_text()]))?;

    let status = status_field(&body).and_then(|raw| {
        AppointmentStatus::from_str(raw).map_err(|_| {
            AppError::ValidationError(vec![
                "\"status\" must be one of [in-progress, done]".to_string(),
            ])
        })
    })?;

    let outcome = state
        .engine
        .set_appointment_status(appointment_id, status)
        .await?;

    let mut response = json!({
        "message": outcome.message(),
        "appointment": outcome.appointment,
    });
    if let Some(next_patient) = &outcome.next_patient {
        response["nextPatient"] = json!(next_patient);
    }

    Ok(Json(response))
}

/// Live queue position and wait for one appointment
pub async fn get_appointment_status(
    State(state): State<QueueState>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_appointment_id(&appointment_id)?;
    let status = state.engine.get_live_status(appointment_id).await?;

    Ok(Json(json!(status)))
}

pub async fn get_doctor_appointments(
    State(state): State<QueueState>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.engine.appointments_for_doctor(&doctor_id).await?;

    Ok(Json(json!(appointments)))
}

pub async fn update_doctor_status(
    State(state): State<QueueState>,
    Path(doctor_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body.map_err(|rejection| AppError::ValidationError(vec![rejection.body_text()]))?;

    let status = status_field(&body).and_then(|raw| {
        DoctorStatus::from_str(raw).map_err(|_| {
            AppError::ValidationError(vec![
                "\"status\" must be one of [on-time, running-late, on-break]".to_string(),
            ])
        })
    })?;

    let change = state.engine.set_doctor_status(&doctor_id, status).await?;
    info!(
        "Doctor {} status change notified {} appointments",
        change.doctor.id, change.notified_appointments
    );

    Ok(Json(json!({
        "message": "Doctor status updated",
        "doctor": change.doctor,
        "note": change.note,
    })))
}

/// Upgrade to a subscriber session
pub async fn queue_socket(State(state): State<QueueState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| serve_subscriber(socket, hub))
}

fn parse_appointment_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound("Appointment not found".to_string()))
}

fn status_field(body: &Value) -> Result<&str, AppError> {
    match body.get("status") {
        Some(Value::String(status)) => Ok(status.as_str()),
        Some(_) => Err(AppError::ValidationError(vec![
            "\"status\" must be a string".to_string(),
        ])),
        None => Err(AppError::ValidationError(vec![
            "\"status\" is required".to_string(),
        ])),
    }
}
