//! Per-session visitor pipeline.
//!
//! Spawned alongside each session. It sleeps until the session ends, then
//! classifies the visit, checks the cool-downs, looks up the address and
//! sends the notification. External calls are bounded by timeouts and their
//! failures only ever show up in the log.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use super::classifier::{Classification, Classifier};
use super::geo::{GeoError, GeoInfo, GeoLookup};
use super::limiter::RateLimiter;
use super::message::{format_message, Report};
use super::sink::{NotificationSink, NotifyError};
use crate::config::VisitorConfig;

/// One connection as seen by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    /// Source address, port stripped
    pub addr: IpAddr,
    pub started: Instant,
    /// Wall-clock start, for the message timestamp
    pub started_at: DateTime<Utc>,
}

impl Visit {
    pub fn begin(addr: IpAddr) -> Self {
        Self {
            addr: addr.to_canonical(),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

/// How a visit was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Within a cool-down window
    Suppressed(Classification),
    /// No sink configured
    Silent(Classification),
    /// Delivery failed or timed out
    Undelivered(Classification),
    Delivered(Classification),
}

impl Outcome {
    pub fn classification(&self) -> Classification {
        match *self {
            Outcome::Suppressed(c)
            | Outcome::Silent(c)
            | Outcome::Undelivered(c)
            | Outcome::Delivered(c) => c,
        }
    }
}

pub struct VisitorWatch<G, S> {
    classifier: Classifier,
    limiter: Arc<RateLimiter>,
    geo: Arc<G>,
    sink: Arc<S>,
    geo_timeout: Duration,
    notify_timeout: Duration,
}

impl<G: GeoLookup, S: NotificationSink> VisitorWatch<G, S> {
    pub fn new(config: &VisitorConfig, limiter: Arc<RateLimiter>, geo: Arc<G>, sink: Arc<S>) -> Self {
        Self {
            classifier: Classifier::new(config.scanner_threshold()),
            limiter,
            geo,
            sink,
            geo_timeout: config.geo_timeout(),
            notify_timeout: config.notify_timeout(),
        }
    }

    /// Wait for the session to end, then handle the visit
    pub async fn run(self: Arc<Self>, visit: Visit, mut ended: watch::Receiver<bool>) -> Outcome {
        // A dropped sender also means the session is gone
        let _ = ended.wait_for(|done| *done).await;
        self.conclude(visit, Instant::now()).await
    }

    /// Handle a visit that ended at `ended_at`
    pub async fn conclude(&self, visit: Visit, ended_at: Instant) -> Outcome {
        let duration = ended_at.saturating_duration_since(visit.started);
        let classification = self.classifier.classify(visit.started, ended_at);

        if !self.limiter.should_notify(visit.addr, classification, ended_at) {
            debug!(addr = %visit.addr, %classification, "notification suppressed");
            return Outcome::Suppressed(classification);
        }

        if !self.sink.is_enabled() {
            info!(addr = %visit.addr, %classification, ?duration, "visit recorded");
            return Outcome::Silent(classification);
        }

        let geo = self.locate(visit.addr).await;
        let location = geo.location();
        let message = format_message(&Report {
            classification,
            addr: visit.addr,
            location: &location,
            duration,
            started_at: visit.started_at,
            timezone: geo.timezone(),
            scanner_cooldown: self.limiter.cooldowns().scanner,
        });

        let delivered = match timeout(self.notify_timeout, self.sink.deliver(&message)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout),
        };

        match delivered {
            Ok(()) => {
                info!(addr = %visit.addr, %classification, %location, ?duration, "visit notified");
                Outcome::Delivered(classification)
            }
            Err(e) => {
                warn!(addr = %visit.addr, %classification, error = %e, "notification dropped");
                Outcome::Undelivered(classification)
            }
        }
    }

    /// Look up `addr`, falling back to an empty result on any failure
    async fn locate(&self, addr: IpAddr) -> GeoInfo {
        let result = match timeout(self.geo_timeout, self.geo.lookup(addr)).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout),
        };
        result.unwrap_or_else(|e| {
            debug!(%addr, error = %e, "geolocation unavailable");
            GeoInfo::default()
        })
    }
}
