use std::io::Write;

use doctor_cell::*;
use tempfile::NamedTempFile;

fn write_seed(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_and_seed_doctors() {
    let file = write_seed(
        r#"[
            {"id": "doc-1", "name": "Dr. Ama Mensah", "specialisation": "Cardiology"},
            {"id": "doc-2", "name": "Dr. Yaw Darko", "status": "running-late", "averageConsultationTime": 30}
        ]"#,
    );

    let doctors = load_seed_file(file.path()).await.unwrap();
    assert_eq!(doctors.len(), 2);

    let registry = InMemoryDoctorRegistry::new();
    let seeded = seed_registry(&registry, doctors).await.unwrap();
    assert_eq!(seeded, 2);

    let late = registry.get("doc-2").await.unwrap().unwrap();
    assert_eq!(late.status, DoctorStatus::RunningLate);
    assert_eq!(late.average_consultation_time.get(), 30);
}

#[tokio::test]
async fn test_duplicate_seed_entries_keep_last() {
    let registry = InMemoryDoctorRegistry::new();
    let doctors = vec![
        Doctor::new("doc-1", "Dr. First"),
        Doctor::new("doc-1", "Dr. Second"),
    ];

    let seeded = seed_registry(&registry, doctors).await.unwrap();
    assert_eq!(seeded, 1);
    assert_eq!(registry.get("doc-1").await.unwrap().unwrap().name, "Dr. Second");
}

#[tokio::test]
async fn test_invalid_seed_file_is_an_error() {
    let file = write_seed(r#"{"id": "not-an-array"}"#);

    let result = load_seed_file(file.path()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_seed_file_is_an_error() {
    let result = load_seed_file("/nonexistent/doctors.json").await;
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to read doctor seed file"), "{}", message);
}
