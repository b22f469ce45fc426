//! Date planning: the search window, trip length rotation, and the weekly
//! fallback grid used when the cheapest-dates endpoint has nothing to say.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::config::SearchConfig;
use crate::deal::Category;
use crate::fares::{DatePair, DateWindow};

/// Departure window: a few days out (no last-minute fares) up to the
/// horizon, both anchored on the scan date.
pub fn search_window(cfg: &SearchConfig, today: NaiveDate) -> DateWindow {
    let from = today + Days::new(u64::from(cfg.from_days));
    let to = today
        .checked_add_months(Months::new(cfg.horizon_months))
        .unwrap_or(from);
    DateWindow { from, to }
}

/// Trip length for the day's scan, rotated by weekday so consecutive daily
/// runs probe different durations without any persisted state.
pub fn duration_for(cfg: &SearchConfig, category: Category, today: NaiveDate) -> u32 {
    let list = match category {
        Category::Europe => &cfg.europe_durations,
        Category::Longhaul => &cfg.longhaul_durations,
    };
    let seed = today.weekday().num_days_from_monday() as usize;
    list.get(seed % list.len().max(1)).copied().unwrap_or(7)
}

/// Weekly departure grid across the window, used when no priced date pairs
/// are available.
pub fn fallback_date_pairs(
    window: DateWindow,
    duration_days: u32,
    max_pairs: usize,
) -> Vec<DatePair> {
    let mut pairs = Vec::new();
    let mut departure = window.from;
    while departure <= window.to && pairs.len() < max_pairs {
        pairs.push(DatePair {
            departure,
            return_date: departure + Days::new(u64::from(duration_days)),
            price: None,
        });
        departure = departure + Days::new(7);
    }
    pairs
}

/// Cheapest pairs first; unpriced pairs go last. Capped at `max_pairs`.
pub fn select_date_pairs(mut pairs: Vec<DatePair>, max_pairs: usize) -> Vec<DatePair> {
    pairs.sort_by(|a, b| match (a.price, b.price) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    pairs.truncate(max_pairs);
    pairs
}
