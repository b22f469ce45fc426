//! Builds [`Deal`]s out of raw offers. Each builder runs a route's rules in a
//! fixed order and bails on the first one an offer misses, so a rejected offer
//! costs almost nothing.

use chrono::{NaiveDate, NaiveDateTime};

use crate::fares::types::{FareOffer, Segment};

use super::fingerprint;
use super::validate::validate_leg;
use super::{Category, Deal, Place, TripKind};

/// A round-trip offer against one route's rules. Only the first two
/// itineraries count: outbound and return.
#[allow(clippy::too_many_arguments)]
pub fn build_round_trip(
    offer: &FareOffer,
    origin: &str,
    destination: &Place,
    max_stopovers: u32,
    stopover_country: Option<&str>,
    price_ceiling: f64,
    category: Category,
    currency: &str,
) -> Option<Deal> {
    let price = parse_price(&offer.price.total)?;
    if offer.price.currency != currency || price > price_ceiling {
        return None;
    }
    let outbound = offer.itineraries.first()?.segments.as_slice();
    let inbound = offer.itineraries.get(1)?.segments.as_slice();
    let outbound_check = validate_leg(outbound, max_stopovers, stopover_country);
    if !outbound_check.passed {
        return None;
    }
    let inbound_check = validate_leg(inbound, max_stopovers, stopover_country);
    if !inbound_check.passed {
        return None;
    }
    let outbound_date = first_departure_date(outbound)?;
    let inbound_date = first_departure_date(inbound)?;
    let fingerprint = fingerprint::round_trip_fingerprint(
        origin,
        &destination.code,
        outbound_date,
        inbound_date,
        price,
        outbound,
        inbound,
    );
    Some(Deal {
        kind: TripKind::Roundtrip {
            destination: destination.clone(),
        },
        price,
        currency: offer.price.currency.clone(),
        outbound_date,
        inbound_date,
        outbound_segments: outbound.to_vec(),
        inbound_segments: inbound.to_vec(),
        outbound_stops: outbound_check.stops,
        inbound_stops: inbound_check.stops,
        airlines: offer.validating_airline_codes.clone(),
        category,
        price_ceiling,
        fingerprint,
    })
}

/// Two one-way offers combined into an open-jaw trip: out to one city, home
/// from another. The ceiling applies to the combined price, and the gap
/// between arriving and flying home must fit the night bounds (whole nights,
/// partial days truncated).
#[allow(clippy::too_many_arguments)]
pub fn build_open_jaw(
    outbound_offer: &FareOffer,
    inbound_offer: &FareOffer,
    origin: &str,
    destination: &Place,
    return_origin: &Place,
    max_stopovers: u32,
    stopover_country: Option<&str>,
    price_ceiling: f64,
    category: Category,
    currency: &str,
    min_nights: i64,
    max_nights: i64,
) -> Option<Deal> {
    let outbound_price = parse_price(&outbound_offer.price.total)?;
    let inbound_price = parse_price(&inbound_offer.price.total)?;
    if outbound_offer.price.currency != currency || inbound_offer.price.currency != currency {
        return None;
    }
    let total_price = outbound_price + inbound_price;
    if total_price > price_ceiling {
        return None;
    }
    let outbound = outbound_offer.itineraries.first()?.segments.as_slice();
    let inbound = inbound_offer.itineraries.first()?.segments.as_slice();
    let outbound_check = validate_leg(outbound, max_stopovers, stopover_country);
    if !outbound_check.passed {
        return None;
    }
    let inbound_check = validate_leg(inbound, max_stopovers, stopover_country);
    if !inbound_check.passed {
        return None;
    }
    let outbound_date = first_departure_date(outbound)?;
    let inbound_date = first_departure_date(inbound)?;
    let arrive = parse_segment_datetime(&outbound.last()?.arrival.at)?;
    let depart = parse_segment_datetime(&inbound.first()?.departure.at)?;
    let nights = depart.signed_duration_since(arrive).num_days();
    if nights < min_nights || nights > max_nights {
        return None;
    }
    let airlines = merge_airlines(
        &outbound_offer.validating_airline_codes,
        &inbound_offer.validating_airline_codes,
    );
    let fingerprint = fingerprint::open_jaw_fingerprint(
        origin,
        &destination.code,
        &return_origin.code,
        outbound_date,
        inbound_date,
        total_price,
        outbound,
        inbound,
    );
    Some(Deal {
        kind: TripKind::OpenJaw {
            destination: destination.clone(),
            return_origin: return_origin.clone(),
        },
        price: total_price,
        currency: currency.to_string(),
        outbound_date,
        inbound_date,
        outbound_segments: outbound.to_vec(),
        inbound_segments: inbound.to_vec(),
        outbound_stops: outbound_check.stops,
        inbound_stops: inbound_check.stops,
        airlines,
        category,
        price_ceiling,
        fingerprint,
    })
}

fn parse_price(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

fn first_departure_date(segments: &[Segment]) -> Option<NaiveDate> {
    parse_segment_date(&segments.first()?.departure.at)
}

fn parse_segment_date(at: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(at.get(..10)?, "%Y-%m-%d").ok()
}

fn parse_segment_datetime(at: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Deduplicated union of both legs' airline codes, first-seen order.
fn merge_airlines(outbound: &[String], inbound: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for code in outbound.iter().chain(inbound) {
        if !merged.iter().any(|existing| existing == code) {
            merged.push(code.clone());
        }
    }
    merged
}
