use axum::{routing::get, Router};

use booking_queue_cell::{create_queue_router, QueueState};

pub fn create_router(state: QueueState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic queue API is running!" }))
        .nest("/api", create_queue_router(state))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use appointment_cell::InMemoryAppointmentStore;
    use axum::{body::Body, http::{Request, StatusCode}};
    use booking_queue_cell::{NotificationHub, QueueEngine};
    use doctor_cell::InMemoryDoctorRegistry;
    use tower::ServiceExt;

    use super::*;

    fn test_router() -> Router {
        let hub = NotificationHub::default();
        let engine = QueueEngine::new(
            Arc::new(InMemoryDoctorRegistry::new()),
            Arc::new(InMemoryAppointmentStore::new()),
            Arc::new(hub.clone()),
        );
        create_router(QueueState::new(engine, hub))
    }

    #[tokio::test]
    async fn test_liveness() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = test_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Clinic queue API is running!");
    }

    #[tokio::test]
    async fn test_queue_routes_are_under_api() {
        let request = Request::builder()
            .uri("/api/appointments/doctor/doc-1")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!([]));

        let request = Request::builder()
            .uri("/appointments/doctor/doc-1")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
