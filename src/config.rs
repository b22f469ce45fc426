use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::deal::Category;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub dedupe: DedupeConfig,
    #[serde(default)]
    pub amadeus: AmadeusConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteRule>,
    #[serde(default = "default_open_jaw_routes")]
    pub open_jaw_routes: Vec<OpenJawRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Searches start this many days out.
    #[serde(default = "default_from_days")]
    pub from_days: u32,
    /// And reach this many months past the start.
    #[serde(default = "default_horizon_months")]
    pub horizon_months: u32,
    #[serde(default = "default_min_nights")]
    pub min_nights: i64,
    #[serde(default = "default_max_nights")]
    pub max_nights: i64,
    #[serde(default = "default_europe_durations")]
    pub europe_durations: Vec<u32>,
    #[serde(default = "default_longhaul_durations")]
    pub longhaul_durations: Vec<u32>,
    #[serde(default = "default_max_date_pairs")]
    pub max_date_pairs: usize,
    #[serde(default = "default_max_offers")]
    pub max_offers: usize,
    /// Country used for one-stop fallback searches on routes that do not
    /// name their own stopover country.
    #[serde(default = "default_fallback_stopover_country")]
    pub fallback_stopover_country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_min_request_gap_ms")]
    pub min_request_gap_ms: u64,
    #[serde(default = "default_between_routes_ms")]
    pub between_routes_ms: u64,
    #[serde(default = "default_between_messages_ms")]
    pub between_messages_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupeConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl DedupeConfig {
    pub fn ttl_ms(&self) -> i64 {
        self.ttl_hours as i64 * 3_600_000
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmadeusConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub telegram_bot_token: String,
    #[serde(default)]
    pub telegram_chat_id: String,
    #[serde(default = "default_enable_stdout")]
    pub enable_stdout: bool,
    #[serde(default = "default_max_messages_per_scan")]
    pub max_messages_per_scan: usize,
}

/// One round-trip destination and the rules an offer must clear for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRule {
    pub destination: String,
    pub name: String,
    #[serde(default)]
    pub max_stopovers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopover_country: Option<String>,
    pub price_ceiling: f64,
    pub category: Category,
    /// Search non-stop first, then fall back to one stop via a country.
    #[serde(default)]
    pub non_stop_preferred: bool,
}

/// Out to one city, home from another. The ceiling covers both one-ways.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenJawRule {
    pub outbound_to: String,
    pub outbound_name: String,
    pub inbound_from: String,
    pub inbound_name: String,
    #[serde(default = "default_open_jaw_max_stopovers")]
    pub max_stopovers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopover_country: Option<String>,
    pub price_ceiling: f64,
    pub category: Category,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub origin: Option<String>,
    pub snapshot_path: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/farewatch/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(origin) = overrides.origin {
            self.search.origin = origin;
        }
        if let Some(snapshot_path) = overrides.snapshot_path {
            self.dedupe.snapshot_path = snapshot_path;
        }
    }

    /// Environment variables beat the file for credentials, so secrets can
    /// stay out of it.
    pub fn apply_env(&mut self) {
        if let Some(key) = env_value("AMADEUS_API_KEY") {
            self.amadeus.api_key = key;
        }
        if let Some(secret) = env_value("AMADEUS_API_SECRET") {
            self.amadeus.api_secret = secret;
        }
        if let Some(token) = env_value("TELEGRAM_BOT_TOKEN") {
            self.alerts.telegram_bot_token = token;
        }
        if let Some(chat_id) = env_value("TELEGRAM_CHAT_ID") {
            self.alerts.telegram_chat_id = chat_id;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.origin.trim().is_empty() {
            return Err(anyhow!("search.origin must be set"));
        }
        if self.search.currency.trim().is_empty() {
            return Err(anyhow!("search.currency must be set"));
        }
        if self.search.min_nights > self.search.max_nights {
            return Err(anyhow!(
                "search.min_nights ({}) exceeds search.max_nights ({})",
                self.search.min_nights,
                self.search.max_nights
            ));
        }
        if self.search.europe_durations.is_empty() || self.search.longhaul_durations.is_empty() {
            return Err(anyhow!("search duration lists must not be empty"));
        }
        if self.search.max_date_pairs == 0 {
            return Err(anyhow!("search.max_date_pairs must be at least 1"));
        }
        if self.search.max_offers == 0 {
            return Err(anyhow!("search.max_offers must be at least 1"));
        }
        if self.routes.is_empty() && self.open_jaw_routes.is_empty() {
            return Err(anyhow!("no routes configured"));
        }
        for route in &self.routes {
            if route.destination.trim().is_empty() {
                return Err(anyhow!("every route needs a destination code"));
            }
            if route.price_ceiling <= 0.0 {
                return Err(anyhow!(
                    "price ceiling for {} must be positive",
                    route.destination
                ));
            }
        }
        for route in &self.open_jaw_routes {
            if route.outbound_to.trim().is_empty() || route.inbound_from.trim().is_empty() {
                return Err(anyhow!("every open-jaw route needs both airport codes"));
            }
            if route.price_ceiling <= 0.0 {
                return Err(anyhow!(
                    "price ceiling for {} / {} must be positive",
                    route.outbound_to,
                    route.inbound_from
                ));
            }
        }
        Ok(())
    }

    pub fn amadeus_credentials(&self) -> Result<(String, String)> {
        let key = self.amadeus.api_key.trim();
        let secret = self.amadeus.api_secret.trim();
        if key.is_empty() || secret.is_empty() {
            return Err(anyhow!(
                "Amadeus credentials missing: set amadeus.api_key / amadeus.api_secret \
                 or the AMADEUS_API_KEY / AMADEUS_API_SECRET environment variables"
            ));
        }
        Ok((key.to_string(), secret.to_string()))
    }

    pub fn telegram_credentials(&self) -> Option<(String, String)> {
        let token = self.alerts.telegram_bot_token.trim();
        let chat_id = self.alerts.telegram_chat_id.trim();
        if token.is_empty() || chat_id.is_empty() {
            return None;
        }
        Some((token.to_string(), chat_id.to_string()))
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_snapshot_path(&self) -> PathBuf {
        expand_tilde(&self.dedupe.snapshot_path)
    }

    pub fn default_template() -> String {
        let template = r#"[search]
origin = "ESB"
currency = "EUR"
from_days = 7
horizon_months = 4
min_nights = 3
max_nights = 14
europe_durations = [3, 4, 5]
longhaul_durations = [7, 10, 14]
max_date_pairs = 4
max_offers = 3
fallback_stopover_country = "DE"

[throttle]
min_request_gap_ms = 350
between_routes_ms = 450
between_messages_ms = 350

[dedupe]
snapshot_path = "seen_deals.json"
ttl_hours = 48

[amadeus]
base_url = "https://test.api.amadeus.com"
api_key = ""
api_secret = ""

[alerts]
telegram_bot_token = ""
telegram_chat_id = ""
enable_stdout = true
max_messages_per_scan = 10

# Declaring any [[routes]] entry replaces the built-in route set.
# [[routes]]
# destination = "LHR"
# name = "London"
# max_stopovers = 0
# price_ceiling = 120.0
# category = "europe"
# non_stop_preferred = true

# [[open_jaw_routes]]
# outbound_to = "GVA"
# outbound_name = "Geneva"
# inbound_from = "BSL"
# inbound_name = "Basel"
# max_stopovers = 1
# price_ceiling = 150.0
# category = "europe"
"#;
        template.to_string()
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            throttle: ThrottleConfig::default(),
            dedupe: DedupeConfig::default(),
            amadeus: AmadeusConfig::default(),
            alerts: AlertsConfig::default(),
            routes: default_routes(),
            open_jaw_routes: default_open_jaw_routes(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            currency: default_currency(),
            from_days: default_from_days(),
            horizon_months: default_horizon_months(),
            min_nights: default_min_nights(),
            max_nights: default_max_nights(),
            europe_durations: default_europe_durations(),
            longhaul_durations: default_longhaul_durations(),
            max_date_pairs: default_max_date_pairs(),
            max_offers: default_max_offers(),
            fallback_stopover_country: default_fallback_stopover_country(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_request_gap_ms: default_min_request_gap_ms(),
            between_routes_ms: default_between_routes_ms(),
            between_messages_ms: default_between_messages_ms(),
        }
    }
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl Default for AmadeusConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            api_secret: String::new(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            enable_stdout: default_enable_stdout(),
            max_messages_per_scan: default_max_messages_per_scan(),
        }
    }
}

fn default_origin() -> String {
    "ESB".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_from_days() -> u32 {
    7
}

fn default_horizon_months() -> u32 {
    4
}

fn default_min_nights() -> i64 {
    3
}

fn default_max_nights() -> i64 {
    14
}

fn default_europe_durations() -> Vec<u32> {
    vec![3, 4, 5]
}

fn default_longhaul_durations() -> Vec<u32> {
    vec![7, 10, 14]
}

fn default_max_date_pairs() -> usize {
    4
}

fn default_max_offers() -> usize {
    3
}

fn default_fallback_stopover_country() -> String {
    "DE".to_string()
}

fn default_min_request_gap_ms() -> u64 {
    350
}

fn default_between_routes_ms() -> u64 {
    450
}

fn default_between_messages_ms() -> u64 {
    350
}

fn default_snapshot_path() -> String {
    "seen_deals.json".to_string()
}

fn default_ttl_hours() -> u64 {
    48
}

fn default_base_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

fn default_enable_stdout() -> bool {
    true
}

fn default_max_messages_per_scan() -> usize {
    10
}

fn default_open_jaw_max_stopovers() -> u32 {
    1
}

fn route(
    destination: &str,
    name: &str,
    max_stopovers: u32,
    price_ceiling: f64,
    category: Category,
) -> RouteRule {
    RouteRule {
        destination: destination.to_string(),
        name: name.to_string(),
        max_stopovers,
        stopover_country: None,
        price_ceiling,
        category,
        non_stop_preferred: false,
    }
}

fn default_routes() -> Vec<RouteRule> {
    let mut routes = Vec::new();

    let europe_non_stop: [(&str, &str, f64); 12] = [
        ("LHR", "London", 120.0),
        ("CDG", "Paris", 120.0),
        ("AMS", "Amsterdam", 120.0),
        ("BCN", "Barcelona", 120.0),
        ("FCO", "Rome", 100.0),
        ("VIE", "Vienna", 100.0),
        ("PRG", "Prague", 100.0),
        ("BRU", "Brussels", 100.0),
        ("ATH", "Athens", 90.0),
        ("BUD", "Budapest", 90.0),
        ("SKP", "Skopje", 80.0),
        ("PRN", "Pristina", 80.0),
    ];
    for (code, name, ceiling) in europe_non_stop {
        let mut rule = route(code, name, 0, ceiling, Category::Europe);
        rule.non_stop_preferred = true;
        routes.push(rule);
    }

    // Thin routes with no direct service from the origin, searched via
    // German hubs.
    let europe_via_germany: [(&str, &str, f64); 2] =
        [("KEF", "Reykjavik", 250.0), ("DUB", "Dublin", 150.0)];
    for (code, name, ceiling) in europe_via_germany {
        let mut rule = route(code, name, 1, ceiling, Category::Europe);
        rule.stopover_country = Some("DE".to_string());
        routes.push(rule);
    }

    let longhaul: [(&str, &str, f64); 15] = [
        ("JFK", "New York", 500.0),
        ("MIA", "Miami", 550.0),
        ("DFW", "Dallas", 550.0),
        ("IAH", "Houston", 550.0),
        ("LAX", "Los Angeles", 550.0),
        ("SFO", "San Francisco", 550.0),
        ("SEA", "Seattle", 550.0),
        ("HNL", "Honolulu", 800.0),
        ("SIN", "Singapore", 500.0),
        ("KUL", "Kuala Lumpur", 450.0),
        ("BKK", "Bangkok", 400.0),
        ("NRT", "Tokyo", 550.0),
        ("SYD", "Sydney", 700.0),
        ("AKL", "Auckland", 900.0),
        ("PER", "Perth", 700.0),
    ];
    for (code, name, ceiling) in longhaul {
        routes.push(route(code, name, 2, ceiling, Category::Longhaul));
    }

    routes
}

fn default_open_jaw_routes() -> Vec<OpenJawRule> {
    [
        ("GVA", "Geneva", "BSL", "Basel"),
        ("MXP", "Milan", "FCO", "Rome"),
        ("BCN", "Barcelona", "MAD", "Madrid"),
    ]
    .into_iter()
    .map(|(outbound_to, outbound_name, inbound_from, inbound_name)| OpenJawRule {
        outbound_to: outbound_to.to_string(),
        outbound_name: outbound_name.to_string(),
        inbound_from: inbound_from.to_string(),
        inbound_name: inbound_name.to_string(),
        max_stopovers: default_open_jaw_max_stopovers(),
        stopover_country: None,
        price_ceiling: 150.0,
        category: Category::Europe,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use crate::deal::Category;

    use super::Config;

    #[test]
    fn defaults_pass_validation() {
        let config = Config::default();
        config.validate().expect("defaults should validate");
        assert!(config
            .routes
            .iter()
            .any(|route| route.category == Category::Europe));
        assert!(config
            .routes
            .iter()
            .any(|route| route.category == Category::Longhaul));
        assert!(!config.open_jaw_routes.is_empty());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [search]
            origin = "IST"
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(parsed.search.origin, "IST");
        assert_eq!(parsed.search.currency, "EUR");
        assert_eq!(parsed.dedupe.ttl_hours, 48);
        assert!(!parsed.routes.is_empty());
    }

    #[test]
    fn declared_routes_replace_the_default_set() {
        let parsed: Config = toml::from_str(
            r#"
            [[routes]]
            destination = "LIS"
            name = "Lisbon"
            price_ceiling = 130.0
            category = "europe"
            non_stop_preferred = true
            "#,
        )
        .expect("route config should parse");
        assert_eq!(parsed.routes.len(), 1);
        assert_eq!(parsed.routes[0].destination, "LIS");
        assert_eq!(parsed.routes[0].max_stopovers, 0);
        assert!(parsed.routes[0].non_stop_preferred);
    }

    #[test]
    fn rejects_inverted_night_bounds() {
        let mut config = Config::default();
        config.search.min_nights = 10;
        config.search.max_nights = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_route_set() {
        let mut config = Config::default();
        config.routes.clear();
        config.open_jaw_routes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn template_parses_back() {
        let parsed: Config =
            toml::from_str(&Config::default_template()).expect("template should parse");
        parsed.validate().expect("template should validate");
        assert_eq!(parsed.search.origin, "ESB");
        assert!(!parsed.routes.is_empty());
    }

    #[test]
    fn credentials_fall_back_to_missing() {
        let config = Config::default();
        assert!(config.amadeus_credentials().is_err());
        assert!(config.telegram_credentials().is_none());
    }

    #[test]
    fn ttl_converts_to_milliseconds() {
        let config = Config::default();
        assert_eq!(config.dedupe.ttl_ms(), 48 * 3_600_000);
    }
}
