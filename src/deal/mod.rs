//! Deal domain: turning raw fare offers into [`Deal`]s that passed a route's
//! rules, plus the fingerprinting that keeps repeat finds quiet.

pub mod builder;
pub mod fingerprint;
pub mod validate;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fares::types::Segment;

pub use builder::{build_open_jaw, build_round_trip};
pub use validate::{validate_leg, StopoverCheck};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Europe,
    Longhaul,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Europe => write!(f, "europe"),
            Category::Longhaul => write!(f, "longhaul"),
        }
    }
}

/// An airport with a display name, e.g. `LHR` / `London`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub code: String,
    pub name: String,
}

impl Place {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TripKind {
    Roundtrip {
        destination: Place,
    },
    #[serde(rename = "openjaw")]
    OpenJaw {
        destination: Place,
        return_origin: Place,
    },
}

/// A fare that cleared every rule on its route. Carries everything the alert
/// layer needs to describe the trip without going back to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(flatten)]
    pub kind: TripKind,
    pub price: f64,
    pub currency: String,
    pub outbound_date: NaiveDate,
    pub inbound_date: NaiveDate,
    pub outbound_segments: Vec<Segment>,
    pub inbound_segments: Vec<Segment>,
    pub outbound_stops: u32,
    pub inbound_stops: u32,
    pub airlines: Vec<String>,
    pub category: Category,
    pub price_ceiling: f64,
    pub fingerprint: String,
}

impl Deal {
    pub fn destination(&self) -> &Place {
        match &self.kind {
            TripKind::Roundtrip { destination } => destination,
            TripKind::OpenJaw { destination, .. } => destination,
        }
    }

    pub fn return_origin(&self) -> Option<&Place> {
        match &self.kind {
            TripKind::Roundtrip { .. } => None,
            TripKind::OpenJaw { return_origin, .. } => Some(return_origin),
        }
    }

    pub fn is_open_jaw(&self) -> bool {
        matches!(self.kind, TripKind::OpenJaw { .. })
    }
}
