use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::{
    create_appointment, get_appointment_status, get_doctor_appointments, queue_socket,
    update_appointment_status, update_doctor_status, QueueState,
};

pub fn create_queue_router(state: QueueState) -> Router {
    Router::new()
        .route("/appointments", post(create_appointment))
        .route(
            "/appointments/{appointment_id}/status",
            patch(update_appointment_status).get(get_appointment_status),
        )
        .route("/appointments/doctor/{doctor_id}", get(get_doctor_appointments))
        .route("/doctors/{doctor_id}/status", patch(update_doctor_status))
        .route("/ws", get(queue_socket))
        .with_state(state)
}
