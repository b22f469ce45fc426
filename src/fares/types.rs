//! Wire types for the fare-search API. Field names mirror the JSON payloads;
//! anything a sloppy response might omit carries a default so one bad offer
//! never sinks the whole batch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPoint {
    pub iata_code: String,
    /// Local timestamp such as `2025-03-14T09:35:00`.
    #[serde(default)]
    pub at: String,
}

/// A single flight between two airports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: SegmentPoint,
    pub arrival: SegmentPoint,
    #[serde(default)]
    pub carrier_code: String,
    #[serde(default)]
    pub number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    /// ISO 8601 duration, e.g. `PT10H25M`.
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfferPrice {
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub currency: String,
}

/// One priced trip option from the offers endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FareOffer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub price: OfferPrice,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
    #[serde(default)]
    pub validating_airline_codes: Vec<String>,
}

/// Row of the cheapest-dates endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheapestDateRow {
    #[serde(default)]
    pub departure_date: String,
    #[serde(default)]
    pub return_date: Option<String>,
    #[serde(default)]
    pub price: DatePrice,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatePrice {
    #[serde(default)]
    pub total: String,
}

/// Both endpoints wrap their payload in a `data` array.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default)]
    pub data: Vec<T>,
}
