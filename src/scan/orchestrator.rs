//! The scan loop: every route, every search mode, every candidate date pair,
//! funnelled through the deal builders and the seen-deal store.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Config, OpenJawRule, RouteRule};
use crate::deal::{build_open_jaw, build_round_trip, Deal, Place};
use crate::dedupe::SeenDealStore;
use crate::fares::{
    CheapestDatesQuery, DatePair, DateWindow, FareError, FareOffer, FareSource, OffersQuery,
};

use super::dates::{duration_for, fallback_date_pairs, search_window, select_date_pairs};
use super::{plan_modes, ScanReport, SearchMode};

/// One full pass over the configured routes. New deals are marked in the
/// store as they are found; the caller decides when to persist it.
pub async fn run_scan(
    fares: &dyn FareSource,
    store: &mut SeenDealStore,
    config: &Config,
) -> ScanReport {
    let started_at = Utc::now();
    let today = started_at.date_naive();
    let between_routes = Duration::from_millis(config.throttle.between_routes_ms);
    let mut deals = Vec::new();
    let mut routes_scanned = 0usize;

    for route in &config.routes {
        info!("scanning {} ({})", route.destination, route.name);
        let found = scan_round_trip_route(fares, store, config, route, today).await;
        if !found.is_empty() {
            info!("{} new deal(s) for {}", found.len(), route.destination);
        }
        deals.extend(found);
        routes_scanned += 1;
        sleep(between_routes).await;
    }

    for route in &config.open_jaw_routes {
        info!(
            "scanning open jaw {} / {}",
            route.outbound_to, route.inbound_from
        );
        let found = scan_open_jaw_route(fares, store, config, route, today).await;
        if !found.is_empty() {
            info!(
                "{} new open-jaw deal(s) for {} / {}",
                found.len(),
                route.outbound_to,
                route.inbound_from
            );
        }
        deals.extend(found);
        routes_scanned += 1;
        sleep(between_routes).await;
    }

    ScanReport {
        started_at,
        finished_at: Utc::now(),
        routes_scanned,
        deals,
    }
}

/// Walks the route's search modes in order and stops at the first
/// non-fallback mode that produced a deal.
async fn scan_round_trip_route(
    fares: &dyn FareSource,
    store: &mut SeenDealStore,
    config: &Config,
    route: &RouteRule,
    today: NaiveDate,
) -> Vec<Deal> {
    let destination = Place::new(route.destination.clone(), route.name.clone());
    let window = search_window(&config.search, today);
    let duration_days = duration_for(&config.search, route.category, today);
    let mut deals = Vec::new();
    for mode in plan_modes(route, &config.search.fallback_stopover_country) {
        let mode_deals = scan_mode(
            fares,
            store,
            config,
            route,
            &destination,
            &mode,
            window,
            duration_days,
        )
        .await;
        let stop = !mode_deals.is_empty() && !mode.fallback;
        deals.extend(mode_deals);
        if stop {
            break;
        }
    }
    deals
}

#[allow(clippy::too_many_arguments)]
async fn scan_mode(
    fares: &dyn FareSource,
    store: &mut SeenDealStore,
    config: &Config,
    route: &RouteRule,
    destination: &Place,
    mode: &SearchMode,
    window: DateWindow,
    duration_days: u32,
) -> Vec<Deal> {
    let pairs = candidate_date_pairs(fares, config, route, mode, window, duration_days).await;
    let mut deals = Vec::new();
    for pair in pairs {
        let query = OffersQuery {
            origin: config.search.origin.clone(),
            destination: route.destination.clone(),
            departure: pair.departure,
            return_date: Some(pair.return_date),
            non_stop: mode.non_stop,
            max_offers: config.search.max_offers,
        };
        let offers = match fares.flight_offers(&query).await {
            Ok(offers) => offers,
            Err(err) if err.is_no_data() => {
                debug!(
                    "no offers for {} on {}: {err}",
                    route.destination, pair.departure
                );
                continue;
            }
            Err(err) => {
                warn!(
                    "offer search failed for {} on {}: {err}",
                    route.destination, pair.departure
                );
                continue;
            }
        };
        for offer in &offers {
            let Some(deal) = build_round_trip(
                offer,
                &config.search.origin,
                destination,
                mode.max_stopovers,
                mode.stopover_country.as_deref(),
                route.price_ceiling,
                route.category,
                &config.search.currency,
            ) else {
                continue;
            };
            if store.has(&deal.fingerprint) {
                debug!("already alerted {} for {}", deal.fingerprint, route.destination);
                continue;
            }
            store.mark(&deal.fingerprint);
            info!(
                "deal: {} ({}) {:.0} {} departing {}",
                route.destination, route.name, deal.price, deal.currency, deal.outbound_date
            );
            deals.push(deal);
        }
    }
    deals
}

/// Asks the cheapest-dates endpoint for priced pairs; any failure or empty
/// answer degrades to the weekly fallback grid.
async fn candidate_date_pairs(
    fares: &dyn FareSource,
    config: &Config,
    route: &RouteRule,
    mode: &SearchMode,
    window: DateWindow,
    duration_days: u32,
) -> Vec<DatePair> {
    let query = CheapestDatesQuery {
        origin: config.search.origin.clone(),
        destination: route.destination.clone(),
        window,
        duration_days,
        non_stop: mode.non_stop,
        max_price: Some(route.price_ceiling),
    };
    match fares.cheapest_dates(&query).await {
        Ok(pairs) if !pairs.is_empty() => select_date_pairs(pairs, config.search.max_date_pairs),
        Ok(_) => {
            debug!(
                "no cheap dates quoted for {}, using the weekly grid",
                route.destination
            );
            fallback_date_pairs(window, duration_days, config.search.max_date_pairs)
        }
        Err(err) => {
            debug!(
                "cheapest-dates lookup for {} failed ({err}), using the weekly grid",
                route.destination
            );
            fallback_date_pairs(window, duration_days, config.search.max_date_pairs)
        }
    }
}

/// Open-jaw legs are two independent one-way searches fetched concurrently,
/// then crossed (at most two offers per direction).
async fn scan_open_jaw_route(
    fares: &dyn FareSource,
    store: &mut SeenDealStore,
    config: &Config,
    route: &OpenJawRule,
    today: NaiveDate,
) -> Vec<Deal> {
    let destination = Place::new(route.outbound_to.clone(), route.outbound_name.clone());
    let return_origin = Place::new(route.inbound_from.clone(), route.inbound_name.clone());
    let window = search_window(&config.search, today);
    let duration_days = duration_for(&config.search, route.category, today);
    let pairs = fallback_date_pairs(window, duration_days, config.search.max_date_pairs);
    let mut deals = Vec::new();
    for pair in pairs {
        let outbound_query = OffersQuery {
            origin: config.search.origin.clone(),
            destination: route.outbound_to.clone(),
            departure: pair.departure,
            return_date: None,
            non_stop: false,
            max_offers: config.search.max_offers,
        };
        let inbound_query = OffersQuery {
            origin: route.inbound_from.clone(),
            destination: config.search.origin.clone(),
            departure: pair.return_date,
            return_date: None,
            non_stop: false,
            max_offers: config.search.max_offers,
        };
        let (outbound_result, inbound_result) = tokio::join!(
            fares.flight_offers(&outbound_query),
            fares.flight_offers(&inbound_query),
        );
        let outbound_offers = offers_or_empty(outbound_result, "outbound");
        let inbound_offers = offers_or_empty(inbound_result, "inbound");
        for outbound in outbound_offers.iter().take(2) {
            for inbound in inbound_offers.iter().take(2) {
                let Some(deal) = build_open_jaw(
                    outbound,
                    inbound,
                    &config.search.origin,
                    &destination,
                    &return_origin,
                    route.max_stopovers,
                    route.stopover_country.as_deref(),
                    route.price_ceiling,
                    route.category,
                    &config.search.currency,
                    config.search.min_nights,
                    config.search.max_nights,
                ) else {
                    continue;
                };
                if store.has(&deal.fingerprint) {
                    debug!(
                        "already alerted {} for {} / {}",
                        deal.fingerprint, route.outbound_to, route.inbound_from
                    );
                    continue;
                }
                store.mark(&deal.fingerprint);
                info!(
                    "open-jaw deal: {} / {} {:.0} {}",
                    route.outbound_to, route.inbound_from, deal.price, deal.currency
                );
                deals.push(deal);
            }
        }
    }
    deals
}

fn offers_or_empty(result: Result<Vec<FareOffer>, FareError>, leg: &str) -> Vec<FareOffer> {
    match result {
        Ok(offers) => offers,
        Err(err) if err.is_no_data() => {
            debug!("no {leg} offers: {err}");
            Vec::new()
        }
        Err(err) => {
            warn!("{leg} offer search failed: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::config::{Config, OpenJawRule, RouteRule};
    use crate::deal::Category;
    use crate::dedupe::SeenDealStore;
    use crate::fares::types::{FareOffer, Itinerary, OfferPrice, Segment, SegmentPoint};
    use crate::fares::{CheapestDatesQuery, DatePair, FareError, FareSource, OffersQuery};

    use super::run_scan;

    /// Offers keyed by (origin, destination, non_stop); records every offers
    /// query it sees.
    struct ScriptedFares {
        offers: Mutex<HashMap<(String, String, bool), Vec<FareOffer>>>,
        offer_queries: Mutex<Vec<OffersQuery>>,
    }

    impl ScriptedFares {
        fn new() -> Self {
            Self {
                offers: Mutex::new(HashMap::new()),
                offer_queries: Mutex::new(Vec::new()),
            }
        }

        fn stub_offers(&self, origin: &str, destination: &str, non_stop: bool, offers: Vec<FareOffer>) {
            self.offers.lock().expect("offers lock").insert(
                (origin.to_string(), destination.to_string(), non_stop),
                offers,
            );
        }

        fn recorded_queries(&self) -> Vec<OffersQuery> {
            self.offer_queries.lock().expect("queries lock").clone()
        }
    }

    #[async_trait]
    impl FareSource for ScriptedFares {
        async fn cheapest_dates(
            &self,
            _query: &CheapestDatesQuery,
        ) -> Result<Vec<DatePair>, FareError> {
            Ok(Vec::new())
        }

        async fn flight_offers(&self, query: &OffersQuery) -> Result<Vec<FareOffer>, FareError> {
            self.offer_queries
                .lock()
                .expect("queries lock")
                .push(query.clone());
            let key = (query.origin.clone(), query.destination.clone(), query.non_stop);
            Ok(self
                .offers
                .lock()
                .expect("offers lock")
                .get(&key)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn segment(from: &str, from_at: &str, to: &str, to_at: &str) -> Segment {
        Segment {
            departure: SegmentPoint {
                iata_code: from.to_string(),
                at: from_at.to_string(),
            },
            arrival: SegmentPoint {
                iata_code: to.to_string(),
                at: to_at.to_string(),
            },
            carrier_code: "TK".to_string(),
            number: "1".to_string(),
        }
    }

    fn offer(total: &str, itineraries: Vec<Vec<Segment>>) -> FareOffer {
        FareOffer {
            id: "1".to_string(),
            price: OfferPrice {
                total: total.to_string(),
                currency: "EUR".to_string(),
            },
            itineraries: itineraries
                .into_iter()
                .map(|segments| Itinerary {
                    duration: String::new(),
                    segments,
                })
                .collect(),
            validating_airline_codes: vec!["TK".to_string()],
        }
    }

    fn non_stop_route(destination: &str, name: &str, ceiling: f64) -> RouteRule {
        RouteRule {
            destination: destination.to_string(),
            name: name.to_string(),
            max_stopovers: 0,
            stopover_country: None,
            price_ceiling: ceiling,
            category: Category::Europe,
            non_stop_preferred: true,
        }
    }

    fn test_config(routes: Vec<RouteRule>, open_jaw_routes: Vec<OpenJawRule>) -> Config {
        let mut config = Config::default();
        config.routes = routes;
        config.open_jaw_routes = open_jaw_routes;
        config.search.max_date_pairs = 1;
        config.throttle.between_routes_ms = 0;
        config
    }

    fn test_store(dir: &tempfile::TempDir) -> SeenDealStore {
        SeenDealStore::new(dir.path().join("seen.json"), 48 * 3_600_000)
    }

    #[tokio::test]
    async fn direct_mode_success_skips_the_fallback_mode() {
        let fares = ScriptedFares::new();
        fares.stub_offers(
            "ESB",
            "LHR",
            true,
            vec![offer(
                "115.00",
                vec![
                    vec![segment("ESB", "2031-05-10T08:00:00", "LHR", "2031-05-10T11:00:00")],
                    vec![segment("LHR", "2031-05-14T14:00:00", "ESB", "2031-05-14T20:00:00")],
                ],
            )],
        );
        let config = test_config(vec![non_stop_route("LHR", "London", 120.0)], Vec::new());
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = test_store(&dir);

        let report = run_scan(&fares, &mut store, &config).await;

        assert_eq!(report.deals.len(), 1);
        assert_eq!(report.routes_scanned, 1);
        assert_eq!(report.deals[0].outbound_stops, 0);
        let queries = fares.recorded_queries();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].non_stop);
    }

    #[tokio::test]
    async fn falls_back_to_via_country_mode_when_direct_finds_nothing() {
        let fares = ScriptedFares::new();
        // Nothing non-stop; one-stop routing through Frankfurt is stubbed.
        fares.stub_offers(
            "ESB",
            "KEF",
            false,
            vec![offer(
                "199.00",
                vec![
                    vec![
                        segment("ESB", "2031-05-10T08:00:00", "FRA", "2031-05-10T10:30:00"),
                        segment("FRA", "2031-05-10T12:00:00", "KEF", "2031-05-10T15:00:00"),
                    ],
                    vec![segment("KEF", "2031-05-14T16:00:00", "ESB", "2031-05-14T23:30:00")],
                ],
            )],
        );
        let config = test_config(vec![non_stop_route("KEF", "Reykjavik", 250.0)], Vec::new());
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = test_store(&dir);

        let report = run_scan(&fares, &mut store, &config).await;

        assert_eq!(report.deals.len(), 1);
        assert_eq!(report.deals[0].outbound_stops, 1);
        assert_eq!(report.deals[0].inbound_stops, 0);
        let queries = fares.recorded_queries();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].non_stop);
        assert!(!queries[1].non_stop);
    }

    #[tokio::test]
    async fn second_scan_skips_already_reported_deals() {
        let fares = ScriptedFares::new();
        fares.stub_offers(
            "ESB",
            "LHR",
            true,
            vec![offer(
                "115.00",
                vec![
                    vec![segment("ESB", "2031-05-10T08:00:00", "LHR", "2031-05-10T11:00:00")],
                    vec![segment("LHR", "2031-05-14T14:00:00", "ESB", "2031-05-14T20:00:00")],
                ],
            )],
        );
        let config = test_config(vec![non_stop_route("LHR", "London", 120.0)], Vec::new());
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = test_store(&dir);

        let first = run_scan(&fares, &mut store, &config).await;
        assert_eq!(first.deals.len(), 1);
        assert_eq!(store.len(), 1);

        let second = run_scan(&fares, &mut store, &config).await;
        assert!(second.deals.is_empty());
    }

    #[tokio::test]
    async fn identical_offers_in_one_batch_are_reported_once() {
        let fares = ScriptedFares::new();
        let duplicate = offer(
            "115.00",
            vec![
                vec![segment("ESB", "2031-05-10T08:00:00", "LHR", "2031-05-10T11:00:00")],
                vec![segment("LHR", "2031-05-14T14:00:00", "ESB", "2031-05-14T20:00:00")],
            ],
        );
        fares.stub_offers("ESB", "LHR", true, vec![duplicate.clone(), duplicate]);
        let config = test_config(vec![non_stop_route("LHR", "London", 120.0)], Vec::new());
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = test_store(&dir);

        let report = run_scan(&fares, &mut store, &config).await;

        assert_eq!(report.deals.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn open_jaw_route_pairs_directional_offers() {
        let fares = ScriptedFares::new();
        fares.stub_offers(
            "ESB",
            "GVA",
            false,
            vec![offer(
                "70.00",
                vec![vec![segment(
                    "ESB",
                    "2031-05-10T08:00:00",
                    "GVA",
                    "2031-05-10T11:00:00",
                )]],
            )],
        );
        fares.stub_offers(
            "BSL",
            "ESB",
            false,
            vec![offer(
                "60.00",
                vec![vec![segment(
                    "BSL",
                    "2031-05-14T12:00:00",
                    "ESB",
                    "2031-05-14T18:00:00",
                )]],
            )],
        );
        let open_jaw = OpenJawRule {
            outbound_to: "GVA".to_string(),
            outbound_name: "Geneva".to_string(),
            inbound_from: "BSL".to_string(),
            inbound_name: "Basel".to_string(),
            max_stopovers: 1,
            stopover_country: None,
            price_ceiling: 150.0,
            category: Category::Europe,
        };
        let config = test_config(Vec::new(), vec![open_jaw]);
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = test_store(&dir);

        let report = run_scan(&fares, &mut store, &config).await;

        assert_eq!(report.routes_scanned, 1);
        assert_eq!(report.deals.len(), 1);
        let deal = &report.deals[0];
        assert!(deal.is_open_jaw());
        assert_eq!(deal.price, 130.0);
        assert_eq!(deal.destination().code, "GVA");
        assert_eq!(deal.return_origin().expect("open jaw has one").code, "BSL");
    }
}
