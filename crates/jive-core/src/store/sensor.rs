// ── Sensor registry ──
//
// The set of published values is fixed at compile time. Every sensor has
// a declared kind and a default that it holds until the first write.

use std::fmt;

use chrono::{DateTime, Utc};
use jive_api::reply::UNKNOWN;
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Identifies one published sensor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, EnumIter, EnumString, IntoStaticStr,
)]
pub enum SensorId {
    #[strum(serialize = "jive5ab-state")]
    State,
    #[strum(serialize = "jive5ab-bytes")]
    Bytes,
    #[strum(serialize = "jive5ab-protocol")]
    Protocol,
    #[strum(serialize = "jive5ab-port")]
    Port,
    #[strum(serialize = "jive5ab-error")]
    Error,
}

impl SensorId {
    /// The published sensor name, e.g. `jive5ab-state`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::State => "jive5ab state",
            Self::Bytes => "bytes written",
            Self::Protocol => "network protocol",
            Self::Port => "net_port",
            Self::Error => "last proxy error",
        }
    }

    pub fn kind(self) -> SensorKind {
        match self {
            Self::Bytes => SensorKind::Integer,
            Self::State | Self::Protocol | Self::Port | Self::Error => SensorKind::String,
        }
    }

    /// Value held from startup until the first successful write.
    pub fn default_value(self) -> SensorValue {
        match self {
            Self::State | Self::Protocol | Self::Port => SensorValue::Text(UNKNOWN.into()),
            Self::Bytes => SensorValue::Integer(0),
            Self::Error => SensorValue::Text(String::new()),
        }
    }
}

/// Declared type of a sensor, named as KATCP names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SensorKind {
    String,
    Integer,
}

/// Current value of a sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorValue {
    Text(String),
    Integer(u64),
}

impl SensorValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(n) => write!(f, "{n}"),
        }
    }
}

/// Health of a reading as reported to KATCP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SensorStatus {
    Nominal,
    Error,
}

/// A sensor value plus when it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub value: SensorValue,
    pub status: SensorStatus,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub(crate) fn initial(id: SensorId, now: DateTime<Utc>) -> Self {
        Self {
            value: id.default_value(),
            status: SensorStatus::Nominal,
            timestamp: now,
        }
    }
}
