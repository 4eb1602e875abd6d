use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::models::Doctor;
use crate::services::registry::DoctorRegistry;

/// Read a JSON array of doctor records.
///
/// `status` defaults to on-time and `averageConsultationTime` to 20 minutes
/// when a record leaves them out.
pub async fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<Doctor>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read doctor seed file {}", path.display()))?;

    let doctors: Vec<Doctor> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid doctor seed file {}", path.display()))?;

    Ok(doctors)
}

pub async fn seed_registry(registry: &dyn DoctorRegistry, doctors: Vec<Doctor>) -> Result<usize> {
    let mut seen = HashSet::new();

    for doctor in &doctors {
        if !seen.insert(doctor.id.clone()) {
            warn!("Doctor {} appears more than once in the seed, last entry wins", doctor.id);
        }
        registry
            .register(doctor.clone())
            .await
            .with_context(|| format!("Failed to register doctor {}", doctor.id))?;
    }

    info!("Seeded {} doctors", seen.len());
    Ok(seen.len())
}
