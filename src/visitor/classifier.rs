//! Scanner vs. visitor classification.
//!
//! Automated scanners connect, grab the banner and leave; people stay and
//! look around. The only signal used is how long the session lasted.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Scanner,
    HumanVisitor,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Scanner => f.write_str("scanner"),
            Classification::HumanVisitor => f.write_str("visitor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    /// Sessions shorter than this are scanners
    pub threshold: Duration,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            threshold: Duration::from_secs(15),
        }
    }
}

impl Classifier {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn classify(&self, started: Instant, ended: Instant) -> Classification {
        self.classify_duration(ended.saturating_duration_since(started))
    }

    pub fn classify_duration(&self, duration: Duration) -> Classification {
        if duration < self.threshold {
            Classification::Scanner
        } else {
            Classification::HumanVisitor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        let c = Classifier::default();
        assert_eq!(c.classify_duration(Duration::from_secs(15)), Classification::HumanVisitor);
        assert_eq!(c.classify_duration(Duration::from_millis(14_999)), Classification::Scanner);
        assert_eq!(c.classify_duration(Duration::ZERO), Classification::Scanner);
        assert_eq!(c.classify_duration(Duration::from_secs(600)), Classification::HumanVisitor);
    }

    #[test]
    fn test_classify_instants() {
        let c = Classifier::default();
        let start = Instant::now();
        assert_eq!(c.classify(start, start + Duration::from_secs(3)), Classification::Scanner);
        assert_eq!(c.classify(start, start + Duration::from_secs(20)), Classification::HumanVisitor);
        // Clock going backwards reads as zero length
        assert_eq!(c.classify(start + Duration::from_secs(20), start), Classification::Scanner);
    }

    #[test]
    fn test_custom_threshold() {
        let c = Classifier::new(Duration::from_secs(5));
        assert_eq!(c.classify_duration(Duration::from_secs(6)), Classification::HumanVisitor);
    }
}
