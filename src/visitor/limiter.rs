//! Per-address notification cool-downs.
//!
//! Two maps behind one lock: addresses recently flagged as scanners, and
//! addresses recently announced as visitors. A scanner entry mutes the
//! address entirely for its window, even if a later session looks human.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::classifier::Classification;
use crate::config::VisitorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldowns {
    pub scanner: Duration,
    pub visitor: Duration,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            scanner: Duration::from_secs(60 * 60),
            visitor: Duration::from_secs(60),
        }
    }
}

impl From<&VisitorConfig> for Cooldowns {
    fn from(config: &VisitorConfig) -> Self {
        Self {
            scanner: config.scanner_cooldown(),
            visitor: config.visitor_cooldown(),
        }
    }
}

#[derive(Debug, Default)]
struct Records {
    scanners: HashMap<IpAddr, Instant>,
    visitors: HashMap<IpAddr, Instant>,
}

/// Shared across all sessions for the lifetime of the server
#[derive(Debug, Default)]
pub struct RateLimiter {
    cooldowns: Cooldowns,
    records: Mutex<Records>,
}

impl RateLimiter {
    pub fn new(cooldowns: Cooldowns) -> Self {
        Self {
            cooldowns,
            records: Mutex::new(Records::default()),
        }
    }

    pub fn cooldowns(&self) -> Cooldowns {
        self.cooldowns
    }

    /// Decide whether to notify about `addr`, recording `now` if so.
    pub fn should_notify(&self, addr: IpAddr, classification: Classification, now: Instant) -> bool {
        let addr = addr.to_canonical();
        let within = |last: Option<&Instant>, window: Duration| {
            last.is_some_and(|t| now.saturating_duration_since(*t) < window)
        };

        // Nothing in here can panic, so a poisoned lock still holds valid maps
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        if within(records.scanners.get(&addr), self.cooldowns.scanner) {
            return false;
        }

        match classification {
            Classification::HumanVisitor => {
                if within(records.visitors.get(&addr), self.cooldowns.visitor) {
                    return false;
                }
                records.visitors.insert(addr, now);
            }
            Classification::Scanner => {
                records.scanners.insert(addr, now);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const MIN: Duration = Duration::from_secs(60);

    fn addr(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(203, 0, 113, last))
    }

    #[test]
    fn test_scanner_mutes_visitor_for_an_hour() {
        let limiter = RateLimiter::default();
        let t = Instant::now();
        let a = addr(1);

        assert!(limiter.should_notify(a, Classification::Scanner, t));
        assert!(!limiter.should_notify(a, Classification::HumanVisitor, t + 30 * MIN));
        assert!(!limiter.should_notify(a, Classification::Scanner, t + 59 * MIN));
        assert!(limiter.should_notify(a, Classification::HumanVisitor, t + 61 * MIN));
    }

    #[test]
    fn test_visitor_cooldown() {
        let limiter = RateLimiter::default();
        let t = Instant::now();
        let b = addr(2);

        assert!(limiter.should_notify(b, Classification::HumanVisitor, t));
        assert!(!limiter.should_notify(b, Classification::HumanVisitor, t + Duration::from_secs(30)));
        assert!(limiter.should_notify(b, Classification::HumanVisitor, t + Duration::from_secs(61)));
    }

    #[test]
    fn test_suppressed_attempt_does_not_extend_window() {
        let limiter = RateLimiter::default();
        let t = Instant::now();
        let b = addr(3);

        assert!(limiter.should_notify(b, Classification::HumanVisitor, t));
        assert!(!limiter.should_notify(b, Classification::HumanVisitor, t + Duration::from_secs(50)));
        assert!(limiter.should_notify(b, Classification::HumanVisitor, t + Duration::from_secs(60)));
    }

    #[test]
    fn test_visitor_then_scanner() {
        // A visitor record does not hold back a scanner report
        let limiter = RateLimiter::default();
        let t = Instant::now();
        let a = addr(4);

        assert!(limiter.should_notify(a, Classification::HumanVisitor, t));
        assert!(limiter.should_notify(a, Classification::Scanner, t + Duration::from_secs(5)));
        assert!(!limiter.should_notify(a, Classification::HumanVisitor, t + 2 * MIN));
    }

    #[test]
    fn test_addresses_are_independent() {
        let limiter = RateLimiter::default();
        let t = Instant::now();

        assert!(limiter.should_notify(addr(5), Classification::Scanner, t));
        assert!(limiter.should_notify(addr(6), Classification::Scanner, t));
        assert!(limiter.should_notify(addr(7), Classification::HumanVisitor, t));
    }

    #[test]
    fn test_ipv4_mapped_addresses_share_records() {
        let limiter = RateLimiter::default();
        let t = Instant::now();
        let v4 = addr(8);
        let mapped = IpAddr::V6(Ipv4Addr::new(203, 0, 113, 8).to_ipv6_mapped());

        assert!(limiter.should_notify(mapped, Classification::Scanner, t));
        assert!(!limiter.should_notify(v4, Classification::HumanVisitor, t + MIN));
        assert!(limiter.should_notify(IpAddr::V6(Ipv6Addr::LOCALHOST), Classification::Scanner, t));
    }

    #[test]
    fn test_custom_cooldowns() {
        let limiter = RateLimiter::new(Cooldowns {
            scanner: Duration::from_secs(10),
            visitor: Duration::from_secs(1),
        });
        let t = Instant::now();
        let a = addr(9);

        assert!(limiter.should_notify(a, Classification::Scanner, t));
        assert!(limiter.should_notify(a, Classification::HumanVisitor, t + Duration::from_secs(10)));
    }

    #[test]
    fn test_concurrent_check_and_record() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::default());
        let t = Instant::now();
        let a = addr(10);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.should_notify(a, Classification::HumanVisitor, t))
            })
            .collect();
        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(granted, 1);
    }
}
