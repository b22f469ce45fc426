//! Stable deal fingerprints: FNV-1a over the fields that make a find unique,
//! so a rescan of the same offer hashes to the same id across runs.

use chrono::NaiveDate;

use crate::fares::types::Segment;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a, rendered as 8 lowercase hex digits.
pub fn fnv1a_hex(input: &str) -> String {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in input.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{hash:08x}")
}

/// Airport codes along a leg joined with `-`, e.g. `ESB-FRA-KEF`.
pub fn airport_chain(segments: &[Segment]) -> String {
    let Some(last) = segments.last() else {
        return String::new();
    };
    let mut codes: Vec<&str> = segments
        .iter()
        .map(|segment| segment.departure.iata_code.as_str())
        .collect();
    codes.push(&last.arrival.iata_code);
    codes.join("-")
}

pub fn round_trip_fingerprint(
    origin: &str,
    destination: &str,
    outbound_date: NaiveDate,
    inbound_date: NaiveDate,
    price: f64,
    outbound: &[Segment],
    inbound: &[Segment],
) -> String {
    let input = format!(
        "RT|{origin}|{destination}|{outbound_date}|{inbound_date}|{price:.2}|{}|{}",
        airport_chain(outbound),
        airport_chain(inbound),
    );
    fnv1a_hex(&input)
}

#[allow(clippy::too_many_arguments)]
pub fn open_jaw_fingerprint(
    origin: &str,
    outbound_destination: &str,
    inbound_origin: &str,
    outbound_date: NaiveDate,
    inbound_date: NaiveDate,
    total_price: f64,
    outbound: &[Segment],
    inbound: &[Segment],
) -> String {
    let input = format!(
        "OJ|{origin}|{outbound_destination}|{inbound_origin}|{outbound_date}|{inbound_date}|{total_price:.2}|{}|{}",
        airport_chain(outbound),
        airport_chain(inbound),
    );
    fnv1a_hex(&input)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::fares::types::{Segment, SegmentPoint};

    use super::{airport_chain, fnv1a_hex, round_trip_fingerprint};

    fn segment(from: &str, to: &str) -> Segment {
        Segment {
            departure: SegmentPoint {
                iata_code: from.to_string(),
                at: String::new(),
            },
            arrival: SegmentPoint {
                iata_code: to.to_string(),
                at: String::new(),
            },
            carrier_code: String::new(),
            number: String::new(),
        }
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
    }

    #[test]
    fn matches_known_fnv1a_vectors() {
        assert_eq!(fnv1a_hex(""), "811c9dc5");
        assert_eq!(fnv1a_hex("a"), "e40c292c");
    }

    #[test]
    fn chain_walks_departures_and_final_arrival() {
        let leg = vec![segment("ESB", "FRA"), segment("FRA", "KEF")];
        assert_eq!(airport_chain(&leg), "ESB-FRA-KEF");
        assert_eq!(airport_chain(&[]), "");
    }

    #[test]
    fn same_inputs_hash_the_same() {
        let out = vec![segment("ESB", "LHR")];
        let back = vec![segment("LHR", "ESB")];
        let a = round_trip_fingerprint(
            "ESB",
            "LHR",
            date("2025-05-10"),
            date("2025-05-14"),
            115.0,
            &out,
            &back,
        );
        let b = round_trip_fingerprint(
            "ESB",
            "LHR",
            date("2025-05-10"),
            date("2025-05-14"),
            115.0,
            &out,
            &back,
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn one_cent_price_change_alters_the_fingerprint() {
        let out = vec![segment("ESB", "LHR")];
        let back = vec![segment("LHR", "ESB")];
        let a = round_trip_fingerprint(
            "ESB",
            "LHR",
            date("2025-05-10"),
            date("2025-05-14"),
            115.00,
            &out,
            &back,
        );
        let b = round_trip_fingerprint(
            "ESB",
            "LHR",
            date("2025-05-10"),
            date("2025-05-14"),
            115.01,
            &out,
            &back,
        );
        assert_ne!(a, b);
    }

    #[test]
    fn different_routing_alters_the_fingerprint() {
        let direct = vec![segment("ESB", "KEF")];
        let via_fra = vec![segment("ESB", "FRA"), segment("FRA", "KEF")];
        let back = vec![segment("KEF", "ESB")];
        let a = round_trip_fingerprint(
            "ESB",
            "KEF",
            date("2025-05-10"),
            date("2025-05-14"),
            199.0,
            &direct,
            &back,
        );
        let b = round_trip_fingerprint(
            "ESB",
            "KEF",
            date("2025-05-10"),
            date("2025-05-14"),
            199.0,
            &via_fra,
            &back,
        );
        assert_ne!(a, b);
    }
}
