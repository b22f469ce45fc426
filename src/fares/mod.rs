//! Fare-search access: the [`FareSource`] trait the scan loop talks to, the
//! query/error types it exchanges, and the Amadeus-backed client implementing
//! it.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub use client::AmadeusClient;
pub use types::FareOffer;

/// Inclusive departure-date range a search may pick dates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// A departure/return date combination, priced when the API quoted one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatePair {
    pub departure: NaiveDate,
    pub return_date: NaiveDate,
    pub price: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CheapestDatesQuery {
    pub origin: String,
    pub destination: String,
    pub window: DateWindow,
    pub duration_days: u32,
    pub non_stop: bool,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct OffersQuery {
    pub origin: String,
    pub destination: String,
    pub departure: NaiveDate,
    /// `None` requests one-way offers.
    pub return_date: Option<NaiveDate>,
    pub non_stop: bool,
    pub max_offers: usize,
}

#[derive(Debug, Error)]
pub enum FareError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited, retry after {wait:?}")]
    RateLimited { wait: Duration },
    #[error("unexpected API status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("retry budget exhausted")]
    Exhausted,
}

impl FareError {
    /// 4xx responses other than 429 mean the API cannot serve this route;
    /// the scan treats them as an empty result rather than a failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, FareError::Status(code) if (400..500).contains(code) && *code != 429)
    }
}

/// Abstraction over the fare-search API so the scan loop can be driven by a
/// scripted source in tests.
#[async_trait]
pub trait FareSource: Send + Sync {
    /// Cheapest departure/return date pairs inside a window.
    async fn cheapest_dates(&self, query: &CheapestDatesQuery)
        -> Result<Vec<DatePair>, FareError>;

    /// Priced offers for a concrete date (pair).
    async fn flight_offers(&self, query: &OffersQuery) -> Result<Vec<FareOffer>, FareError>;
}
