//! Application configuration.

use jiff::tz::TimeZone;

use harvest::lead_time::LeadTime;

/// Explicitly constructed configuration for the application.
///
/// There is no ambient global lookup anywhere below this point: the
/// config is built at the entry point (CLI, tests) and injected into
/// [`AppContext`](crate::context::AppContext).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,

    /// Canonical time zone for delivery-date handling; `None` uses the
    /// network's home zone (Europe/London).
    pub time_zone: Option<TimeZone>,
}

impl AppConfig {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            time_zone: None,
        }
    }

    /// The lead-time validator for the configured zone.
    #[must_use]
    pub fn lead_time(&self) -> LeadTime {
        match &self.time_zone {
            Some(tz) => LeadTime::new(tz.clone()),
            None => LeadTime::uk(),
        }
    }
}
