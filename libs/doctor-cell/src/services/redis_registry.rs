use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use shared_database::{connection, RedisPool, StoreError};

use crate::models::{Doctor, DoctorStatus};
use crate::services::registry::DoctorRegistry;

/// Doctor registry backed by one Redis hash per doctor (`doctor:{id}`).
#[derive(Clone)]
pub struct RedisDoctorRegistry {
    pool: RedisPool,
    key_prefix: String,
}

impl RedisDoctorRegistry {
    pub fn new(pool: RedisPool) -> Self {
        Self::with_prefix(pool, "")
    }

    /// Namespaces every key, which keeps test runs isolated from each other.
    pub fn with_prefix(pool: RedisPool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    fn doctor_key(&self, doctor_id: &str) -> String {
        format!("{}doctor:{}", self.key_prefix, doctor_id)
    }

    async fn write(&self, doctor: &Doctor) -> Result<(), StoreError> {
        let mut conn = connection(&self.pool).await?;
        let key = self.doctor_key(&doctor.id);
        let data = serde_json::to_string(doctor)?;

        let _: () = conn
            .hset_multiple(&key, &[("data", data.as_str()), ("status", doctor.status.as_str())])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DoctorRegistry for RedisDoctorRegistry {
    async fn get(&self, doctor_id: &str) -> Result<Option<Doctor>, StoreError> {
        let mut conn = connection(&self.pool).await?;
        let data: Option<String> = conn.hget(self.doctor_key(doctor_id), "data").await?;

        match data {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    // Last writer wins: transitions are unconstrained and carry no history.
    async fn set_status(
        &self,
        doctor_id: &str,
        status: DoctorStatus,
    ) -> Result<Option<Doctor>, StoreError> {
        let Some(mut doctor) = self.get(doctor_id).await? else {
            return Ok(None);
        };

        doctor.status = status;
        self.write(&doctor).await?;
        debug!("Doctor {} status set to {}", doctor_id, status);

        Ok(Some(doctor))
    }

    async fn register(&self, doctor: Doctor) -> Result<Doctor, StoreError> {
        self.write(&doctor).await?;
        debug!("Registered doctor {} in Redis", doctor.id);
        Ok(doctor)
    }
}
