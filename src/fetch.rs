//! Data acquisition: the two GETs of a wake cycle and the degraded-data
//! policy that keeps the cycle moving when either of them fails.

use chrono::NaiveDate;
use log::{info, warn};

use crate::catalog::Category;
use crate::config::DashboardConfig;
use crate::schedule::{self, NextCollection};
use crate::time_ref;

/// Raw HTTP outcome as seen by the acquisition phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Blocking HTTP GET. The firmware implements this over the ESP-IDF client;
/// tests substitute canned responses.
pub trait Transport {
    fn get(&mut self, url: &str) -> anyhow::Result<Response>;
}

/// Why a fetch produced no usable data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DegradedReason {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("malformed JSON: {0}")]
    Malformed(String),
    #[error("invalid address ID")]
    InvalidAddress,
    #[error("no service dates for address")]
    NoServiceDates,
    #[error("invalid time reference")]
    InvalidTime,
    #[error("unparseable date {0:?}")]
    BadDate(String),
}

/// Result of one fetch: fresh data, or the reason it is missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Fresh(T),
    Degraded(DegradedReason),
}

impl<T> Fetched<T> {
    pub fn fresh(&self) -> Option<&T> {
        match self {
            Fetched::Fresh(v) => Some(v),
            Fetched::Degraded(_) => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Fetched::Fresh(_))
    }
}

/// Placeholder date shown when nothing was fetched.
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Full,
    Partial,
}

/// Everything the render phase needs from the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub schedule: Fetched<NextCollection>,
    pub today: Fetched<NaiveDate>,
}

impl Acquisition {
    pub fn next_date(&self) -> NaiveDate {
        self.schedule
            .fresh()
            .map(|n| n.date)
            .unwrap_or_else(sentinel_date)
    }

    pub fn current_date(&self) -> NaiveDate {
        self.today.fresh().copied().unwrap_or_else(sentinel_date)
    }

    pub fn categories(&self) -> &[Category] {
        self.schedule
            .fresh()
            .map(|n| n.categories.as_slice())
            .unwrap_or(&[])
    }

    pub fn completeness(&self) -> Completeness {
        if self.schedule.is_fresh() && self.today.is_fresh() {
            Completeness::Full
        } else {
            Completeness::Partial
        }
    }
}

/// Issue a GET and hand back the body only for a 200.
fn get_ok<T: Transport>(transport: &mut T, url: &str) -> Result<String, DegradedReason> {
    let response = transport
        .get(url)
        .map_err(|e| DegradedReason::Transport(format!("{:#}", e)))?;
    if response.status != 200 {
        return Err(DegradedReason::Status(response.status));
    }
    Ok(response.body)
}

pub fn fetch_schedule<T: Transport>(
    transport: &mut T,
    cfg: &DashboardConfig,
    address_id: &str,
) -> Fetched<NextCollection> {
    let outcome = get_ok(transport, &cfg.schedule_url(address_id))
        .and_then(|body| schedule::parse_next_collection(&body));
    match outcome {
        Ok(next) => {
            info!(
                "Next collection {} ({} categories)",
                next.date,
                next.categories.len()
            );
            Fetched::Fresh(next)
        }
        Err(reason) => {
            warn!("Schedule fetch degraded: {}", reason);
            Fetched::Degraded(reason)
        }
    }
}

pub fn fetch_today<T: Transport>(transport: &mut T, cfg: &DashboardConfig) -> Fetched<NaiveDate> {
    let outcome =
        get_ok(transport, &cfg.time_url).and_then(|body| time_ref::parse_current_date(&body));
    match outcome {
        Ok(date) => {
            info!("Current date {}", date);
            Fetched::Fresh(date)
        }
        Err(reason) => {
            warn!("Time fetch degraded: {}", reason);
            Fetched::Degraded(reason)
        }
    }
}

/// Run both fetches in order. Never fails; missing data is carried as
/// `Fetched::Degraded`.
pub fn acquire<T: Transport>(
    transport: &mut T,
    cfg: &DashboardConfig,
    address_id: &str,
) -> Acquisition {
    let schedule = fetch_schedule(transport, cfg, address_id);
    let today = fetch_today(transport, cfg);
    Acquisition { schedule, today }
}
