use std::env;

use bml_core::booking::DEFAULT_ID_PREFIX;
use bml_core::BookingType;
use chrono::Duration;
use tracing::warn;

const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct ConciergeConfig {
    pub booking_session_ttl: Duration,
    /// Booking types whose subtype flow is open. Others answer "coming soon".
    pub enabled_booking_types: Vec<BookingType>,
    pub booking_id_prefix: String,
}

impl Default for ConciergeConfig {
    fn default() -> Self {
        Self {
            booking_session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            enabled_booking_types: vec![BookingType::Entry],
            booking_id_prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

impl ConciergeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let booking_session_ttl = lookup("BML_BOOKING_SESSION_TTL_MINUTES")
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|minutes| *minutes > 0)
            .and_then(Duration::try_minutes)
            .unwrap_or(defaults.booking_session_ttl);

        let enabled_booking_types = lookup("BML_BOOKING_TYPES")
            .map(|raw| parse_booking_types(&raw))
            .filter(|types| !types.is_empty())
            .unwrap_or(defaults.enabled_booking_types);

        let booking_id_prefix = lookup("BML_VENUE_PREFIX")
            .map(|raw| raw.trim().to_uppercase())
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(defaults.booking_id_prefix);

        Self {
            booking_session_ttl,
            enabled_booking_types,
            booking_id_prefix,
        }
    }

    pub fn is_enabled(&self, booking_type: BookingType) -> bool {
        self.enabled_booking_types.contains(&booking_type)
    }
}

fn parse_booking_types(raw: &str) -> Vec<BookingType> {
    let mut types = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        match BookingType::parse(item) {
            Some(booking_type) if !types.contains(&booking_type) => types.push(booking_type),
            Some(_) => {}
            None => warn!(value = %item, "ignoring unknown booking type in BML_BOOKING_TYPES"),
        }
    }
    types
}
