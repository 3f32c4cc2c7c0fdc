//! Measurements returned by external data providers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single external measurement.
///
/// Keeps a genuine zero reading apart from a value the provider could not
/// deliver. Scoring still substitutes zero for unavailable readings, but the
/// caller always knows when that happened.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reading {
    Measured { value: f64 },
    Unavailable { reason: String },
}

impl Reading {
    #[must_use]
    pub fn measured(value: f64) -> Self {
        Self::Measured { value }
    }

    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured { .. })
    }

    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Measured { value } => Some(*value),
            Self::Unavailable { .. } => None,
        }
    }

    /// Value used by the scoring formula; unavailable readings count as zero
    #[must_use]
    pub fn value_or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Measured { .. } => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured { value } => write!(f, "{value:.2}"),
            Self::Unavailable { .. } => write!(f, "unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measured_zero_is_not_unavailable() {
        let zero = Reading::measured(0.0);
        assert!(zero.is_measured());
        assert_eq!(zero.value(), Some(0.0));

        let missing = Reading::unavailable("timeout");
        assert!(!missing.is_measured());
        assert_eq!(missing.value(), None);
        assert_eq!(missing.value_or_zero(), 0.0);
        assert_eq!(missing.reason(), Some("timeout"));
    }

    #[test]
    fn test_reading_serialization_is_tagged() {
        let json = serde_json::to_value(Reading::measured(42.0)).unwrap();
        assert_eq!(json["status"], "measured");
        assert_eq!(json["value"], 42.0);

        let json = serde_json::to_value(Reading::unavailable("no key")).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "no key");
    }
}
