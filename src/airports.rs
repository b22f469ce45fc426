//! Static IATA airport to country lookup used by the stopover rules.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static AIRPORT_COUNTRY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let entries: &[(&str, &str)] = &[
        // Germany
        ("FRA", "DE"),
        ("MUC", "DE"),
        ("DUS", "DE"),
        ("BER", "DE"),
        ("HAM", "DE"),
        ("STR", "DE"),
        ("CGN", "DE"),
        ("HAJ", "DE"),
        ("NUE", "DE"),
        ("LEJ", "DE"),
        ("DTM", "DE"),
        ("FMO", "DE"),
        ("PAD", "DE"),
        ("SCN", "DE"),
        // Turkey
        ("ESB", "TR"),
        ("IST", "TR"),
        ("SAW", "TR"),
        ("AYT", "TR"),
        ("ADB", "TR"),
        ("DLM", "TR"),
        ("BJV", "TR"),
        // United Kingdom
        ("LHR", "GB"),
        ("LGW", "GB"),
        ("STN", "GB"),
        ("LTN", "GB"),
        ("MAN", "GB"),
        ("EDI", "GB"),
        ("BHX", "GB"),
        // France
        ("CDG", "FR"),
        ("ORY", "FR"),
        ("NCE", "FR"),
        ("LYS", "FR"),
        ("MRS", "FR"),
        ("TLS", "FR"),
        // Netherlands
        ("AMS", "NL"),
        ("EIN", "NL"),
        ("RTM", "NL"),
        // Spain
        ("MAD", "ES"),
        ("BCN", "ES"),
        ("PMI", "ES"),
        ("AGP", "ES"),
        ("ALC", "ES"),
        ("VLC", "ES"),
        // Italy
        ("FCO", "IT"),
        ("MXP", "IT"),
        ("LIN", "IT"),
        ("VCE", "IT"),
        ("NAP", "IT"),
        ("BGY", "IT"),
        // Switzerland
        ("ZRH", "CH"),
        ("GVA", "CH"),
        ("BSL", "CH"),
        // Austria
        ("VIE", "AT"),
        ("SZG", "AT"),
        ("INN", "AT"),
        // Belgium
        ("BRU", "BE"),
        ("CRL", "BE"),
        // Portugal
        ("LIS", "PT"),
        ("OPO", "PT"),
        ("FAO", "PT"),
        // Greece
        ("ATH", "GR"),
        ("SKG", "GR"),
        ("HER", "GR"),
        // Czechia
        ("PRG", "CZ"),
        // Hungary
        ("BUD", "HU"),
        // Ireland
        ("DUB", "IE"),
        ("SNN", "IE"),
        ("ORK", "IE"),
        // Iceland
        ("KEF", "IS"),
        // Balkans
        ("SKP", "MK"),
        ("PRN", "XK"),
        // United States
        ("JFK", "US"),
        ("EWR", "US"),
        ("LGA", "US"),
        ("LAX", "US"),
        ("SFO", "US"),
        ("ORD", "US"),
        ("MIA", "US"),
        ("DFW", "US"),
        ("IAH", "US"),
        ("ATL", "US"),
        ("SEA", "US"),
        ("BOS", "US"),
        ("DEN", "US"),
        ("PHX", "US"),
        ("LAS", "US"),
        ("HNL", "US"),
        // Asia
        ("SIN", "SG"),
        ("KUL", "MY"),
        ("BKK", "TH"),
        ("NRT", "JP"),
        ("HND", "JP"),
        // Oceania
        ("SYD", "AU"),
        ("MEL", "AU"),
        ("BNE", "AU"),
        ("PER", "AU"),
        ("AKL", "NZ"),
        ("CHC", "NZ"),
        // Middle East transit hubs
        ("DXB", "AE"),
        ("DOH", "QA"),
        ("AUH", "AE"),
    ];
    entries.iter().copied().collect()
});

/// ISO 3166-1 alpha-2 country for an IATA airport code, if the airport is
/// known. Callers must treat `None` as "cannot verify", never as a match.
pub fn country_for(iata: &str) -> Option<&'static str> {
    AIRPORT_COUNTRY.get(iata).copied()
}

#[cfg(test)]
mod tests {
    use super::country_for;

    #[test]
    fn resolves_known_airports() {
        assert_eq!(country_for("FRA"), Some("DE"));
        assert_eq!(country_for("ESB"), Some("TR"));
        assert_eq!(country_for("PRN"), Some("XK"));
    }

    #[test]
    fn unknown_airport_resolves_to_none() {
        assert_eq!(country_for("XXX"), None);
        assert_eq!(country_for(""), None);
    }
}
