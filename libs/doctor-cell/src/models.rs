use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Consultation length assumed when a doctor record does not carry one.
pub const DEFAULT_CONSULTATION_MINUTES: NonZeroU32 = match NonZeroU32::new(20) {
    Some(minutes) => minutes,
    None => panic!("default consultation time must be positive"),
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialisation: Option<String>,
    #[serde(default)]
    pub status: DoctorStatus,
    /// Minutes per consultation.
    #[serde(default = "default_consultation_time")]
    pub average_consultation_time: NonZeroU32,
}

fn default_consultation_time() -> NonZeroU32 {
    DEFAULT_CONSULTATION_MINUTES
}

impl Doctor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            specialisation: None,
            status: DoctorStatus::default(),
            average_consultation_time: DEFAULT_CONSULTATION_MINUTES,
        }
    }

    pub fn with_specialisation(mut self, specialisation: impl Into<String>) -> Self {
        self.specialisation = Some(specialisation.into());
        self
    }

    pub fn with_status(mut self, status: DoctorStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_average_consultation_time(mut self, minutes: NonZeroU32) -> Self {
        self.average_consultation_time = minutes;
        self
    }

    pub fn is_on_break(&self) -> bool {
        self.status == DoctorStatus::OnBreak
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DoctorStatus {
    #[default]
    OnTime,
    RunningLate,
    OnBreak,
}

impl DoctorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorStatus::OnTime => "on-time",
            DoctorStatus::RunningLate => "running-late",
            DoctorStatus::OnBreak => "on-break",
        }
    }
}

impl fmt::Display for DoctorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoctorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on-time" => Ok(DoctorStatus::OnTime),
            "running-late" => Ok(DoctorStatus::RunningLate),
            "on-break" => Ok(DoctorStatus::OnBreak),
            other => Err(format!(
                "Invalid doctor status '{}', expected one of on-time, running-late, on-break",
                other
            )),
        }
    }
}
