use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    faq_matches_total: AtomicU64,
    faq_fallbacks_total: AtomicU64,
    accessibility_total: AtomicU64,
    booking_steps_total: AtomicU64,
    validation_errors_total: AtomicU64,
    state_errors_total: AtomicU64,
    bookings_confirmed_total: AtomicU64,
    collaborator_failures_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub faq_matches_total: u64,
    pub faq_fallbacks_total: u64,
    pub accessibility_total: u64,
    pub booking_steps_total: u64,
    pub validation_errors_total: u64,
    pub state_errors_total: u64,
    pub bookings_confirmed_total: u64,
    pub collaborator_failures_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_faq_match(&self) {
        self.faq_matches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_faq_fallback(&self) {
        self.faq_fallbacks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_accessibility(&self) {
        self.accessibility_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_booking_step(&self) {
        self.booking_steps_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_validation_error(&self) {
        self.validation_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_state_error(&self) {
        self.state_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_booking_confirmed(&self) {
        self.bookings_confirmed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_collaborator_failure(&self) {
        self.collaborator_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            faq_matches_total: self.faq_matches_total.load(Ordering::Relaxed),
            faq_fallbacks_total: self.faq_fallbacks_total.load(Ordering::Relaxed),
            accessibility_total: self.accessibility_total.load(Ordering::Relaxed),
            booking_steps_total: self.booking_steps_total.load(Ordering::Relaxed),
            validation_errors_total: self.validation_errors_total.load(Ordering::Relaxed),
            state_errors_total: self.state_errors_total.load(Ordering::Relaxed),
            bookings_confirmed_total: self.bookings_confirmed_total.load(Ordering::Relaxed),
            collaborator_failures_total: self.collaborator_failures_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

/// JSON logs; `RUST_LOG` overrides the default filter. Safe to call repeatedly.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,bml_api=info,bml_agents=info",
                service_name
            ))
        });

        let _ = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .try_init();
    });
}
