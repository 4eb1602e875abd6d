// Runs against a live Redis only when REDIS_TEST_URL is set.

use chrono::{Duration, Utc};
use uuid::Uuid;

use appointment_cell::*;
use shared_config::AppConfig;
use shared_database::create_redis_pool;

async fn test_store() -> Option<RedisAppointmentStore> {
    let url = std::env::var("REDIS_TEST_URL").ok()?;
    let config = AppConfig {
        redis_url: Some(url),
        ..AppConfig::default()
    };
    let pool = create_redis_pool(&config).await.ok()?;
    Some(RedisAppointmentStore::with_prefix(
        pool,
        format!("test_{}:", Uuid::new_v4().simple()),
    ))
}

#[tokio::test]
async fn test_redis_store_queue_queries() {
    let Some(store) = test_store().await else {
        eprintln!("REDIS_TEST_URL not set, skipping");
        return;
    };

    let mut created = Vec::new();
    for (index, patient) in ["Ama", "Kojo", "Esi"].iter().enumerate() {
        let appointment = store
            .create(NewAppointment {
                patient_name: patient.to_string(),
                doctor_id: "doc-1".to_string(),
                scheduled_time: Utc::now() + Duration::hours(1),
                queue_number: index as u32 + 1,
            })
            .await
            .unwrap();
        created.push(appointment);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    assert_eq!(store.count_waiting("doc-1").await.unwrap(), 3);
    assert_eq!(
        store.find_earliest_waiting("doc-1").await.unwrap().unwrap().id,
        created[0].id
    );

    let swap = store
        .compare_and_set_status(created[0].id, AppointmentStatus::Waiting, AppointmentStatus::InProgress)
        .await
        .unwrap();
    assert!(matches!(swap, StatusSwap::Swapped(_)));

    let conflict = store
        .compare_and_set_status(created[0].id, AppointmentStatus::Waiting, AppointmentStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(conflict, StatusSwap::Conflict(AppointmentStatus::InProgress));

    store.set_status(created[1].id, AppointmentStatus::Done).await.unwrap();

    let active: Vec<Uuid> = store
        .list_active("doc-1")
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(active, vec![created[0].id, created[2].id]);
    assert_eq!(store.count_ahead_of("doc-1", created[2].created_at).await.unwrap(), 1);
    assert_eq!(store.list_by_doctor("doc-1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_redis_store_record_agrees_with_index() {
    let Some(store) = test_store().await else {
        eprintln!("REDIS_TEST_URL not set, skipping");
        return;
    };

    let mut created = Vec::new();
    for (index, patient) in ["Ama", "Kojo", "Esi", "Yaw", "Akua"].iter().enumerate() {
        created.push(
            store
                .create(NewAppointment {
                    patient_name: patient.to_string(),
                    doctor_id: "doc-1".to_string(),
                    scheduled_time: Utc::now() + Duration::hours(1),
                    queue_number: index as u32 + 1,
                })
                .await
                .unwrap(),
        );
    }

    for appointment in &created {
        assert_eq!(appointment.created_at.timestamp_subsec_nanos() % 1_000, 0);
        let stored = store.get(appointment.id).await.unwrap().unwrap();
        assert_eq!(stored.created_at, appointment.created_at);
    }

    // Positions derived from the record must match the index order.
    let active = store.list_active("doc-1").await.unwrap();
    for (rank, appointment) in active.iter().enumerate() {
        let ahead = store
            .count_ahead_of("doc-1", appointment.created_at)
            .await
            .unwrap();
        assert!(ahead as usize <= rank);
    }
}
