//! Telegram-flavoured HTML messages: one summary per scan, then one message
//! per deal, hottest price ratios getting the most fire.

use reqwest::Url;

use crate::deal::{Category, Deal};
use crate::fares::types::Segment;
use crate::scan::ScanReport;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Search link for the trip; open jaws spell out both one-ways.
pub fn google_flights_link(origin: &str, deal: &Deal) -> String {
    let destination = &deal.destination().code;
    let query = match deal.return_origin() {
        Some(return_origin) => format!(
            "Flights from {origin} to {destination} on {} and from {} to {origin} on {}",
            deal.outbound_date, return_origin.code, deal.inbound_date
        ),
        None => format!(
            "Flights from {origin} to {destination} on {} through {}",
            deal.outbound_date, deal.inbound_date
        ),
    };
    Url::parse_with_params(
        "https://www.google.com/travel/flights",
        [("q", query.as_str())],
    )
    .expect("static base URL is valid")
    .to_string()
}

pub fn deal_message(origin: &str, deal: &Deal) -> String {
    let ratio = deal.price / deal.price_ceiling;
    let fire = if ratio < 0.6 {
        "🔥🔥🔥"
    } else if ratio < 0.8 {
        "🔥🔥"
    } else {
        "🔥"
    };
    let emoji = match deal.category {
        Category::Europe => "🇪🇺",
        Category::Longhaul => "🌏",
    };
    let title = match deal.return_origin() {
        Some(return_origin) => format!(
            "{} → {}",
            deal.destination().name.to_uppercase(),
            return_origin.name.to_uppercase()
        ),
        None => deal.destination().name.to_uppercase(),
    };
    let trip_marker = if deal.is_open_jaw() { "✈️ OPEN JAW" } else { "✈️" };
    let link = google_flights_link(origin, deal);

    let lines = vec![
        format!("{emoji} <b>{}</b> {fire}", escape_html(&title)),
        String::new(),
        format!("💰 <b>{:.0} {}</b>", deal.price, escape_html(&deal.currency)),
        trip_marker.to_string(),
        String::new(),
        format!(
            "📅 <b>Outbound:</b> {}  ({})",
            deal.outbound_date,
            stops_label(deal.outbound_stops)
        ),
        format!("🛫 {}", escape_html(&display_chain(&deal.outbound_segments))),
        String::new(),
        format!(
            "📅 <b>Return:</b> {}  ({})",
            deal.inbound_date,
            stops_label(deal.inbound_stops)
        ),
        format!("🛬 {}", escape_html(&display_chain(&deal.inbound_segments))),
        String::new(),
        format!("✈️ {}", escape_html(&deal.airlines.join(", "))),
        String::new(),
        format!("🔗 <a href=\"{link}\">Search on Google Flights</a>"),
    ];
    lines.join("\n")
}

pub fn summary_message(origin: &str, report: &ScanReport) -> String {
    let lines = vec![
        "🔔 <b>CHEAP FLIGHT ALERT!</b>".to_string(),
        String::new(),
        format!(
            "📍 {} deals found departing {}:",
            report.deals.len(),
            escape_html(origin)
        ),
        format!("🇪🇺 Europe: {}", report.europe_count()),
        format!("🌏 Long haul: {}", report.longhaul_count()),
        String::new(),
        format!("⏰ {}", report.finished_at.format("%Y-%m-%d %H:%M UTC")),
    ];
    lines.join("\n")
}

fn stops_label(stops: u32) -> String {
    match stops {
        0 => "Direct".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{n} stops"),
    }
}

fn display_chain(segments: &[Segment]) -> String {
    let Some(last) = segments.last() else {
        return String::new();
    };
    let mut codes: Vec<&str> = segments
        .iter()
        .map(|segment| segment.departure.iata_code.as_str())
        .collect();
    codes.push(&last.arrival.iata_code);
    codes.join(" → ")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use crate::deal::{Category, Deal, Place, TripKind};
    use crate::fares::types::{Segment, SegmentPoint};
    use crate::scan::ScanReport;

    use super::{deal_message, escape_html, google_flights_link, summary_message};

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
            carrier_code: "TK".to_string(),
            number: "1".to_string(),
        }
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
    }

    fn deal(price: f64, ceiling: f64, open_jaw: bool) -> Deal {
        let kind = if open_jaw {
            TripKind::OpenJaw {
                destination: Place::new("GVA", "Geneva"),
                return_origin: Place::new("BSL", "Basel"),
            }
        } else {
            TripKind::Roundtrip {
                destination: Place::new("LHR", "London"),
            }
        };
        let (out_to, in_from) = if open_jaw { ("GVA", "BSL") } else { ("LHR", "LHR") };
        Deal {
            kind,
            price,
            currency: "EUR".to_string(),
            outbound_date: date("2025-05-10"),
            inbound_date: date("2025-05-14"),
            outbound_segments: vec![segment("ESB", out_to)],
            inbound_segments: vec![segment(in_from, "ESB")],
            outbound_stops: 0,
            inbound_stops: 0,
            airlines: vec!["TK".to_string()],
            category: Category::Europe,
            price_ceiling: ceiling,
            fingerprint: "deadbeef".to_string(),
        }
    }

    #[test]
    fn escapes_html_specials() {
        assert_eq!(escape_html("<b> & co >"), "&lt;b&gt; &amp; co &gt;");
    }

    #[test]
    fn fire_scales_with_the_price_ratio() {
        assert_eq!(deal_message("ESB", &deal(60.0, 120.0, false)).matches('🔥').count(), 3);
        assert_eq!(deal_message("ESB", &deal(84.0, 120.0, false)).matches('🔥').count(), 2);
        assert_eq!(deal_message("ESB", &deal(115.0, 120.0, false)).matches('🔥').count(), 1);
    }

    #[test]
    fn round_trip_message_names_the_destination() {
        let message = deal_message("ESB", &deal(115.0, 120.0, false));
        assert!(message.contains("<b>LONDON</b>"));
        assert!(message.contains("💰 <b>115 EUR</b>"));
        assert!(message.contains("(Direct)"));
        assert!(message.contains("🛫 ESB → LHR"));
        assert!(!message.contains("OPEN JAW"));
    }

    #[test]
    fn open_jaw_message_titles_both_cities() {
        let message = deal_message("ESB", &deal(130.0, 150.0, true));
        assert!(message.contains("GENEVA → BASEL"));
        assert!(message.contains("✈️ OPEN JAW"));
    }

    #[test]
    fn link_spells_out_the_search() {
        let link = google_flights_link("ESB", &deal(115.0, 120.0, false));
        assert!(link.starts_with("https://www.google.com/travel/flights?q="));
        assert!(link.contains("Flights+from+ESB+to+LHR"));
        assert!(link.contains("2025-05-10"));

        let open_jaw_link = google_flights_link("ESB", &deal(130.0, 150.0, true));
        assert!(open_jaw_link.contains("from+BSL+to+ESB"));
    }

    #[test]
    fn summary_counts_by_category() {
        let report = ScanReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            routes_scanned: 3,
            deals: vec![
                deal(60.0, 120.0, false),
                deal(80.0, 120.0, false),
                deal(130.0, 150.0, true),
            ],
        };
        let message = summary_message("ESB", &report);
        assert!(message.contains("3 deals found departing ESB"));
        assert!(message.contains("🇪🇺 Europe: 3"));
        assert!(message.contains("🌏 Long haul: 0"));
    }
}
