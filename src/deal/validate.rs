//! Per-leg stopover rules.

use crate::airports::country_for;
use crate::fares::types::Segment;

/// Outcome of checking one leg against a route's stopover rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopoverCheck {
    pub passed: bool,
    pub stops: u32,
}

/// Checks a leg's stop count and, when a country is required, that every
/// intermediate airport sits in it. An intermediate airport we cannot place
/// in any country fails the country rule.
pub fn validate_leg(
    segments: &[Segment],
    max_stopovers: u32,
    required_country: Option<&str>,
) -> StopoverCheck {
    let stops = segments.len().saturating_sub(1) as u32;
    if stops > max_stopovers {
        return StopoverCheck {
            passed: false,
            stops,
        };
    }
    let Some(country) = required_country else {
        return StopoverCheck {
            passed: true,
            stops,
        };
    };
    if stops == 0 {
        return StopoverCheck {
            passed: true,
            stops,
        };
    }
    let passed = segments[..segments.len() - 1]
        .iter()
        .all(|segment| country_for(&segment.arrival.iata_code) == Some(country));
    StopoverCheck { passed, stops }
}
