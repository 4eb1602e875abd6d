// libs/appointment-cell/src/services/redis_store.rs
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use redis::{AsyncCommands, Script};
use tracing::debug;
use uuid::Uuid;

use shared_database::{connection, RedisPool, StoreError};

use crate::models::{Appointment, AppointmentStatus, NewAppointment, StatusSwap};
use crate::services::store::{saturating_count, AppointmentStore};

// KEYS[1] appointment hash; ARGV expected status, new status, new record JSON.
const COMPARE_AND_SET_STATUS: &str = r"
local current = redis.call('HGET', KEYS[1], 'status')
if not current then
  return {'missing'}
end
if current ~= ARGV[1] then
  return {'conflict', current}
end
redis.call('HSET', KEYS[1], 'status', ARGV[2], 'data', ARGV[3])
return {'ok'}
";

/// Appointment store on Redis.
///
/// Layout:
/// - `appointment:{id}` hash with `data` (JSON record), `status` and `doctor_id`
/// - `doctor_appointments:{doctor_id}` sorted set of ids scored by `created_at`
#[derive(Clone)]
pub struct RedisAppointmentStore {
    pool: RedisPool,
    key_prefix: String,
    compare_and_set: Script,
}

impl RedisAppointmentStore {
    pub fn new(pool: RedisPool) -> Self {
        Self::with_prefix(pool, "")
    }

    pub fn with_prefix(pool: RedisPool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
            compare_and_set: Script::new(COMPARE_AND_SET_STATUS),
        }
    }

    fn appointment_key(&self, id: Uuid) -> String {
        format!("{}appointment:{}", self.key_prefix, id)
    }

    fn doctor_index_key(&self, doctor_id: &str) -> String {
        format!("{}doctor_appointments:{}", self.key_prefix, doctor_id)
    }

    fn score(created_at: &DateTime<Utc>) -> f64 {
        created_at.timestamp_micros() as f64
    }

    // Record and index must agree, so created_at keeps only what the score holds.
    fn creation_time(now: DateTime<Utc>) -> DateTime<Utc> {
        now.trunc_subsecs(6)
    }

    async fn load_for_doctor(&self, doctor_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let mut conn = connection(&self.pool).await?;
        let ids: Vec<String> = conn.zrange(self.doctor_index_key(doctor_id), 0, -1).await?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hget(format!("{}appointment:{}", self.key_prefix, id), "data");
        }
        let records: Vec<Option<String>> = pipe.query_async(&mut conn).await?;

        let mut appointments = Vec::with_capacity(records.len());
        for (id, record) in ids.iter().zip(records) {
            match record {
                Some(raw) => appointments.push(serde_json::from_str::<Appointment>(&raw)?),
                None => debug!("Index entry {} for doctor {} has no record", id, doctor_id),
            }
        }

        // zrange already orders by score; equal scores fall back to the id.
        Ok(appointments)
    }

    async fn write(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let mut conn = connection(&self.pool).await?;
        let data = serde_json::to_string(appointment)?;

        let _: () = conn
            .hset_multiple(
                self.appointment_key(appointment.id),
                &[
                    ("data", data.as_str()),
                    ("status", appointment.status.as_str()),
                    ("doctor_id", appointment.doctor_id.as_str()),
                ],
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for RedisAppointmentStore {
    async fn create(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let now = Self::creation_time(Utc::now());
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_name: new.patient_name,
            doctor_id: new.doctor_id,
            scheduled_time: new.scheduled_time,
            queue_number: new.queue_number,
            status: AppointmentStatus::Waiting,
            created_at: now,
            updated_at: now,
        };

        let mut conn = connection(&self.pool).await?;
        let data = serde_json::to_string(&appointment)?;

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(
                self.appointment_key(appointment.id),
                &[
                    ("data", data.as_str()),
                    ("status", appointment.status.as_str()),
                    ("doctor_id", appointment.doctor_id.as_str()),
                ],
            )
            .ignore()
            .zadd(
                self.doctor_index_key(&appointment.doctor_id),
                appointment.id.to_string(),
                Self::score(&appointment.created_at),
            )
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!("Appointment {} stored in Redis", appointment.id);
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let mut conn = connection(&self.pool).await?;
        let data: Option<String> = conn.hget(self.appointment_key(id), "data").await?;

        match data {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn count_waiting(&self, doctor_id: &str) -> Result<u32, StoreError> {
        let appointments = self.load_for_doctor(doctor_id).await?;
        Ok(saturating_count(
            appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Waiting)
                .count(),
        ))
    }

    async fn find_earliest_waiting(
        &self,
        doctor_id: &str,
    ) -> Result<Option<Appointment>, StoreError> {
        let appointments = self.load_for_doctor(doctor_id).await?;
        Ok(appointments
            .into_iter()
            .find(|a| a.status == AppointmentStatus::Waiting))
    }

    async fn list_active(&self, doctor_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.load_for_doctor(doctor_id).await?;
        Ok(appointments.into_iter().filter(Appointment::is_active).collect())
    }

    async fn list_by_doctor(&self, doctor_id: &str) -> Result<Vec<Appointment>, StoreError> {
        self.load_for_doctor(doctor_id).await
    }

    async fn count_ahead_of(
        &self,
        doctor_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let appointments = self.load_for_doctor(doctor_id).await?;
        Ok(saturating_count(
            appointments
                .iter()
                .filter(|a| a.is_active() && a.created_at < created_at)
                .count(),
        ))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, StoreError> {
        let Some(mut appointment) = self.get(id).await? else {
            return Ok(None);
        };

        appointment.status = status;
        appointment.updated_at = Utc::now();
        self.write(&appointment).await?;

        Ok(Some(appointment))
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<StatusSwap, StoreError> {
        let Some(mut appointment) = self.get(id).await? else {
            return Ok(StatusSwap::NotFound);
        };

        if appointment.status != expected {
            return Ok(StatusSwap::Conflict(appointment.status));
        }

        // Every other field is immutable, so only the status check has to run
        // inside the script.
        appointment.status = status;
        appointment.updated_at = Utc::now();
        let data = serde_json::to_string(&appointment)?;
        let key = self.appointment_key(id);

        let mut conn = connection(&self.pool).await?;
        let reply: Vec<String> = self
            .compare_and_set
            .key(&key)
            .arg(expected.as_str())
            .arg(status.as_str())
            .arg(data)
            .invoke_async(&mut conn)
            .await?;

        match reply.as_slice() {
            [outcome] if outcome == "ok" => Ok(StatusSwap::Swapped(appointment)),
            [outcome] if outcome == "missing" => Ok(StatusSwap::NotFound),
            [outcome, current] if outcome == "conflict" => {
                let current = current.parse::<AppointmentStatus>().map_err(|reason| {
                    StoreError::CorruptRecord { key: key.clone(), reason }
                })?;
                Ok(StatusSwap::Conflict(current))
            }
            other => Err(StoreError::CorruptRecord {
                key,
                reason: format!("unexpected script reply {:?}", other),
            }),
        }
    }
}
