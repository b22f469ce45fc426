//! Flight fare scanner: polls a fare-search API over a configured route set,
//! filters offers through per-route deal rules, and pushes new finds to
//! Telegram.

pub mod airports;
pub mod alert;
pub mod config;
pub mod deal;
pub mod dedupe;
pub mod fares;
pub mod output;
pub mod scan;
