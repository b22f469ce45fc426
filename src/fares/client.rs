//! Amadeus-backed [`FareSource`]. Handles OAuth2 token caching, a minimum gap
//! between requests, and retries with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::types::{CheapestDateRow, DataEnvelope, FareOffer};
use super::{CheapestDatesQuery, DatePair, FareError, FareSource, OffersQuery};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;
/// Refresh the token this long before the API says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const MAX_ATTEMPTS: u32 = 4;
const INITIAL_BACKOFF: Duration = Duration::from_millis(800);
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;
const MIN_RETRY_AFTER_SECS: u64 = 5;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

pub struct AmadeusClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    currency: String,
    min_request_gap: Duration,
    token: Mutex<Option<CachedToken>>,
    last_request: Mutex<Option<Instant>>,
}

impl AmadeusClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        currency: impl Into<String>,
        min_request_gap: Duration,
    ) -> Self {
        let http = Client::builder()
            .user_agent("farewatch/0.1")
            .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .expect("failed to build fare API HTTP client");
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            currency: currency.into(),
            min_request_gap,
            token: Mutex::new(None),
            last_request: Mutex::new(None),
        }
    }

    /// Waits out the minimum gap since the previous request, then stamps now.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(at) = *last {
            let next_allowed = at + self.min_request_gap;
            let now = Instant::now();
            if next_allowed > now {
                sleep(next_allowed - now).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn access_token(&self) -> Result<String, FareError> {
        let mut cached = self.token.lock().await;
        if let Some(existing) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < existing.expires_at {
                return Ok(existing.token.clone());
            }
        }
        // The token fetch is an outbound call like any other.
        self.throttle().await;
        let response = self
            .http
            .post(format!("{}/v1/security/oauth2/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.api_secret.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FareError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }
        let body: TokenResponse = response.json().await?;
        if body.access_token.is_empty() {
            return Err(FareError::Auth("token endpoint returned an empty token".into()));
        }
        let expires_at = Instant::now() + Duration::from_secs(body.expires_in);
        *cached = Some(CachedToken {
            token: body.access_token.clone(),
            expires_at,
        });
        Ok(body.access_token)
    }

    /// One GET with auth and throttling, classified into [`FareError`].
    async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, FareError> {
        let token = self.access_token().await?;
        self.throttle().await;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(FareError::RateLimited {
                wait: retry_after(&response),
            });
        }
        if !response.status().is_success() {
            return Err(FareError::Status(response.status().as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    /// Retry wrapper: rate limits wait out the server-advised interval and
    /// consume an attempt, no-data responses abort immediately, everything
    /// else backs off exponentially until the attempt budget runs dry.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, FareError> {
        let mut delay = INITIAL_BACKOFF;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.request_json(path, params).await {
                Ok(value) => return Ok(value),
                Err(FareError::RateLimited { wait }) => {
                    warn!("rate limited on {path}, waiting {}s", wait.as_secs());
                    sleep(wait).await;
                }
                Err(err) if err.is_no_data() => return Err(err),
                Err(err) if attempt == MAX_ATTEMPTS => return Err(err),
                Err(err) => {
                    debug!(
                        "attempt {attempt}/{MAX_ATTEMPTS} for {path} failed: {err}, backing off {}ms",
                        delay.as_millis()
                    );
                    sleep(delay).await;
                    delay *= 2;
                }
            }
        }
        Err(FareError::Exhausted)
    }
}

#[async_trait]
impl FareSource for AmadeusClient {
    async fn cheapest_dates(
        &self,
        query: &CheapestDatesQuery,
    ) -> Result<Vec<DatePair>, FareError> {
        let non_stop = if query.non_stop { "true" } else { "false" };
        let mut params = vec![
            ("origin".to_string(), query.origin.clone()),
            ("destination".to_string(), query.destination.clone()),
            (
                "departureDate".to_string(),
                format!("{},{}", query.window.from, query.window.to),
            ),
            ("oneWay".to_string(), "false".to_string()),
            ("duration".to_string(), query.duration_days.to_string()),
            ("nonStop".to_string(), non_stop.to_string()),
            ("viewBy".to_string(), "DATE".to_string()),
        ];
        if let Some(max_price) = query.max_price {
            params.push(("maxPrice".to_string(), (max_price.floor() as i64).to_string()));
        }
        let envelope: DataEnvelope<CheapestDateRow> =
            self.get_json("/v1/shopping/flight-dates", &params).await?;
        Ok(envelope.data.iter().filter_map(row_to_pair).collect())
    }

    async fn flight_offers(&self, query: &OffersQuery) -> Result<Vec<FareOffer>, FareError> {
        let mut params = vec![
            ("originLocationCode".to_string(), query.origin.clone()),
            ("destinationLocationCode".to_string(), query.destination.clone()),
            ("departureDate".to_string(), query.departure.to_string()),
            ("adults".to_string(), "1".to_string()),
            ("currencyCode".to_string(), self.currency.clone()),
            ("max".to_string(), query.max_offers.to_string()),
        ];
        if let Some(return_date) = query.return_date {
            params.push(("returnDate".to_string(), return_date.to_string()));
        }
        if query.non_stop {
            params.push(("nonStop".to_string(), "true".to_string()));
        }
        let envelope: DataEnvelope<FareOffer> =
            self.get_json("/v2/shopping/flight-offers", &params).await?;
        Ok(envelope.data)
    }
}

fn retry_after(response: &Response) -> Duration {
    let secs = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs.max(MIN_RETRY_AFTER_SECS))
}

/// Rows with unparseable dates are dropped; a bad price only clears the quote.
fn row_to_pair(row: &CheapestDateRow) -> Option<DatePair> {
    let departure = NaiveDate::parse_from_str(&row.departure_date, "%Y-%m-%d").ok()?;
    let return_raw = row.return_date.as_deref()?;
    let return_date = NaiveDate::parse_from_str(return_raw, "%Y-%m-%d").ok()?;
    let price = row
        .price
        .total
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite());
    Some(DatePair {
        departure,
        return_date,
        price,
    })
}
