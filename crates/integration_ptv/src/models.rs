//! PTV response models
//!
//! Typed representations of the health check status and nearby stops as
//! returned by the PTV timetable API. Missing fields decode to their zero
//! value and unknown fields are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status flags returned by `/v2/healthcheck`
#[allow(clippy::struct_excessive_bools)] // Mirrors the four flags of the API response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    /// The signature and developer id were accepted
    #[serde(rename = "securityTokenOK")]
    pub security_token_ok: bool,
    /// The request timestamp is close enough to the server clock
    #[serde(rename = "clientClockOK")]
    pub client_clock_ok: bool,
    /// The server cache is reachable
    #[serde(rename = "memcacheOK")]
    pub memcache_ok: bool,
    /// The server database is reachable
    #[serde(rename = "databaseOK")]
    pub database_ok: bool,
}

impl HealthStatus {
    /// Returns true if every flag is set
    #[must_use]
    pub const fn all_ok(&self) -> bool {
        self.security_token_ok && self.client_clock_ok && self.memcache_ok && self.database_ok
    }
}

/// Mode of transport served by a stop
///
/// Only the five values 0 to 4 are accepted on the wire. Any other integer
/// fails decoding, which makes the whole response a [`crate::PtvError::Decode`]
/// with the response metadata attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RouteType {
    /// Metropolitan train
    #[default]
    Train,
    /// Tram
    Tram,
    /// Bus
    Bus,
    /// V/Line regional train and coach
    VLine,
    /// Night bus
    NightBus,
}

impl RouteType {
    /// All known route types, in wire order
    pub const ALL: [Self; 5] = [Self::Train, Self::Tram, Self::Bus, Self::VLine, Self::NightBus];

    /// Human-readable name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Train => "Train",
            Self::Tram => "Tram",
            Self::Bus => "Bus",
            Self::VLine => "V/Line",
            Self::NightBus => "Night Bus",
        }
    }
}

impl TryFrom<u8> for RouteType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| format!("unknown route type: {value}"))
    }
}

impl From<RouteType> for u8 {
    fn from(route_type: RouteType) -> Self {
        route_type as Self
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A single transport stop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stop {
    /// Distance from the queried coordinates
    pub distance: f64,
    /// Suburb the stop is located in
    pub suburb: String,
    /// Transport type label, e.g. "train"
    pub transport_type: String,
    /// Route type enumeration value
    pub route_type: RouteType,
    /// Stop identifier
    pub stop_id: i64,
    /// Stop name
    pub location_name: String,
    /// Latitude
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}) #{}",
            self.location_name, self.suburb, self.route_type, self.stop_id
        )
    }
}

/// One entry of the `/v2/nearme` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearMeResult {
    /// The stop itself
    pub result: Stop,
    /// Result kind label, e.g. "stop"
    #[serde(rename = "type")]
    pub kind: String,
}

/// Ordered stops returned by `/v2/nearme`
pub type NearMeResponse = Vec<NearMeResult>;
