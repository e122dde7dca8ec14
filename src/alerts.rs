//! Operational alerts raised by the scheduler.
//!
//! Alerts are appended to an [`AlertLog`] and resolve themselves once they
//! are [`ALERT_TTL_MS`] old. Some kinds are deduplicated: while an unresolved
//! alert of that kind exists for a forklift, new ones are dropped.

use std::collections::BTreeSet;
use std::fmt;

use crate::clock::Timestamp;
use crate::grid::Position;
use crate::{generate_id, Id};

/// Age at which an alert resolves itself.
pub const ALERT_TTL_MS: u64 = 30_000;

/// Source id for alerts not tied to a forklift.
pub const SYSTEM_SOURCE: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlertKind {
    Collision,
    Stuck,
    LowFuel,
    PathBlocked,
    Overload,
    MaintenanceRequired,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertKind::Collision => "collision",
            AlertKind::Stuck => "stuck",
            AlertKind::LowFuel => "low_fuel",
            AlertKind::PathBlocked => "path_blocked",
            AlertKind::Overload => "overload",
            AlertKind::MaintenanceRequired => "maintenance_required",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmergencyAlert {
    pub id: Id,
    pub kind: AlertKind,
    /// Forklift id, or [`SYSTEM_SOURCE`].
    pub forklift_id: Id,
    pub position: Position,
    pub message: String,
    pub timestamp: Timestamp,
    pub resolved: bool,
    pub severity: Severity,
}

impl EmergencyAlert {
    pub fn new(
        kind: AlertKind,
        severity: Severity,
        forklift_id: impl Into<Id>,
        position: Position,
        message: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: generate_id(),
            kind,
            forklift_id: forklift_id.into(),
            position,
            message: message.into(),
            timestamp,
            resolved: false,
            severity,
        }
    }
}

/// Alert kinds that are raised at most once per forklift until resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DedupPolicy {
    kinds: BTreeSet<AlertKind>,
}

impl DedupPolicy {
    /// A policy that never suppresses anything.
    pub fn none() -> Self {
        Self {
            kinds: BTreeSet::new(),
        }
    }

    pub fn with(mut self, kind: AlertKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    pub fn applies_to(&self, kind: AlertKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self::none()
            .with(AlertKind::LowFuel)
            .with(AlertKind::MaintenanceRequired)
    }
}

/// Append-only alert history.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    alerts: Vec<EmergencyAlert>,
    policy: DedupPolicy,
}

impl AlertLog {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            alerts: Vec::new(),
            policy,
        }
    }

    pub fn set_policy(&mut self, policy: DedupPolicy) {
        self.policy = policy;
    }

    /// Records an alert. Returns false if the dedup policy dropped it.
    pub fn raise(&mut self, alert: EmergencyAlert) -> bool {
        if self.policy.applies_to(alert.kind) && self.has_unresolved(alert.kind, &alert.forklift_id)
        {
            return false;
        }
        tracing::warn!(
            kind = %alert.kind,
            forklift = %alert.forklift_id,
            position = %alert.position,
            severity = ?alert.severity,
            "{}",
            alert.message
        );
        self.alerts.push(alert);
        true
    }

    /// Resolves every alert at least [`ALERT_TTL_MS`] old. Returns how many
    /// were resolved.
    pub fn age(&mut self, now: Timestamp) -> usize {
        let mut resolved = 0;
        for alert in self.alerts.iter_mut().filter(|a| !a.resolved) {
            if now.saturating_sub(alert.timestamp) >= ALERT_TTL_MS {
                alert.resolved = true;
                resolved += 1;
            }
        }
        resolved
    }

    pub fn has_unresolved(&self, kind: AlertKind, forklift_id: &str) -> bool {
        self.alerts
            .iter()
            .any(|a| !a.resolved && a.kind == kind && a.forklift_id == forklift_id)
    }

    pub fn all(&self) -> &[EmergencyAlert] {
        &self.alerts
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &EmergencyAlert> {
        self.alerts.iter().filter(|a| !a.resolved)
    }

    /// Alerts of one kind, resolved or not.
    pub fn of_kind(&self, kind: AlertKind) -> impl Iterator<Item = &EmergencyAlert> {
        self.alerts.iter().filter(move |a| a.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low_fuel(forklift: &str, at: Timestamp) -> EmergencyAlert {
        EmergencyAlert::new(
            AlertKind::LowFuel,
            Severity::High,
            forklift,
            Position::new(1, 1),
            "fuel low",
            at,
        )
    }

    #[test]
    fn alert_ids_are_unique() {
        assert_ne!(low_fuel("a", 0).id, low_fuel("a", 0).id);
    }

    #[test]
    fn dedup_per_forklift() {
        let mut log = AlertLog::new(DedupPolicy::default());
        assert!(log.raise(low_fuel("a", 0)));
        assert!(!log.raise(low_fuel("a", 10)));
        assert!(log.raise(low_fuel("b", 10)));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn overload_is_not_deduplicated_by_default() {
        let mut log = AlertLog::default();
        let overload = || {
            EmergencyAlert::new(
                AlertKind::Overload,
                Severity::Critical,
                "a",
                Position::new(0, 0),
                "too heavy",
                0,
            )
        };
        assert!(log.raise(overload()));
        assert!(log.raise(overload()));
        assert_eq!(log.of_kind(AlertKind::Overload).count(), 2);
    }

    #[test]
    fn aging_resolves_at_ttl() {
        let mut log = AlertLog::default();
        log.raise(low_fuel("a", 1_000));
        assert_eq!(log.age(1_000 + ALERT_TTL_MS - 1), 0);
        assert!(log.has_unresolved(AlertKind::LowFuel, "a"));
        assert_eq!(log.age(1_000 + ALERT_TTL_MS), 1);
        assert!(!log.has_unresolved(AlertKind::LowFuel, "a"));
        assert_eq!(log.unresolved().count(), 0);
        // resolved alerts no longer suppress new ones
        assert!(log.raise(low_fuel("a", 40_000)));
    }

    #[test]
    fn empty_policy_allows_duplicates() {
        let mut log = AlertLog::new(DedupPolicy::none());
        assert!(log.raise(low_fuel("a", 0)));
        assert!(log.raise(low_fuel("a", 0)));
    }
}
