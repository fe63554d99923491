use std::fmt::Display;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A closed tracked interval. The currently open session never materializes
/// as a [Session]: while tracking, only its start instant exists (the
/// [crate::store::Slot::CurrentSession] marker), so every record here
/// carries its final duration and is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub device_type: DeviceType,
}

impl Session {
    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time: start,
            end_time: end,
            duration: end - start,
            device_type: DeviceType::Computer,
        }
    }
}

/// The kind of device a session was tracked on. This client only ever
/// produces [DeviceType::Computer], the tag exists for log compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Computer,
    Phone,
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Computer => write!(f, "computer"),
            DeviceType::Phone => write!(f, "phone"),
        }
    }
}

/// A user-declared daily time commitment. Immutable once declared, only
/// removable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intention {
    pub id: Uuid,
    pub description: String,
    /// Minutes per day the user claims they'll hold themselves to.
    pub time_committed: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub birth_year: i32,
    /// Expected lifespan in years.
    pub life_expectancy: i32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            birth_year: 1995,
            life_expectancy: 80,
        }
    }
}

/// Payload of the open-session marker slot: start of the open session, or
/// null while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenSession(
    #[serde(with = "chrono::serde::ts_milliseconds_option")] pub Option<DateTime<Utc>>,
);

mod duration_ms {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = i64::deserialize(deserializer)?;
        Ok(Duration::milliseconds(ms))
    }
}
