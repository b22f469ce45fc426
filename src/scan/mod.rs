//! Scan orchestration: which search modes a route gets, which dates they
//! probe, and the loop that walks every route and collects fresh deals.

pub mod dates;
pub mod orchestrator;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RouteRule;
use crate::deal::{Category, Deal};

pub use orchestrator::run_scan;

/// One way of searching a route. Fallback modes only run when the preferred
/// mode finds nothing, and their finds never stop the mode loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMode {
    pub non_stop: bool,
    pub max_stopovers: u32,
    pub stopover_country: Option<String>,
    pub fallback: bool,
}

/// Routes that prefer non-stop get two modes: direct, then one stop routed
/// through the route's stopover country (or the configured fallback country).
/// Everyone else gets the single mode their rules describe.
pub fn plan_modes(route: &RouteRule, fallback_stopover_country: &str) -> Vec<SearchMode> {
    if route.non_stop_preferred {
        let country = route
            .stopover_country
            .clone()
            .unwrap_or_else(|| fallback_stopover_country.to_string());
        return vec![
            SearchMode {
                non_stop: true,
                max_stopovers: 0,
                stopover_country: None,
                fallback: false,
            },
            SearchMode {
                non_stop: false,
                max_stopovers: 1,
                stopover_country: Some(country),
                fallback: true,
            },
        ];
    }
    vec![SearchMode {
        non_stop: route.max_stopovers == 0,
        max_stopovers: route.max_stopovers,
        stopover_country: route.stopover_country.clone(),
        fallback: false,
    }]
}

/// Everything one scan pass produced, for output and alerting.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub routes_scanned: usize,
    pub deals: Vec<Deal>,
}

impl ScanReport {
    pub fn europe_count(&self) -> usize {
        self.deals
            .iter()
            .filter(|deal| deal.category == Category::Europe)
            .count()
    }

    pub fn longhaul_count(&self) -> usize {
        self.deals
            .iter()
            .filter(|deal| deal.category == Category::Longhaul)
            .count()
    }
}
