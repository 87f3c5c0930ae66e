use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::aggregator::{self, GroupAggregates};
use crate::config::keys;
use crate::config::settings::Thresholds;
use crate::error::{AttributeIssue, DiscoveryError};

/// Outcome of resolving one configured key on one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReadingOutcome {
    Measured {
        value: f64,
        quality_good: bool,
        questionable: bool,
        timestamp: Option<String>,
    },
    Unavailable {
        issue: AttributeIssue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub display_name: String,
    #[serde(flatten)]
    pub outcome: ReadingOutcome,
}

impl Reading {
    pub fn measured(display_name: impl Into<String>, value: f64) -> Self {
        Self {
            display_name: display_name.into(),
            outcome: ReadingOutcome::Measured {
                value,
                quality_good: true,
                questionable: false,
                timestamp: None,
            },
        }
    }

    pub fn unavailable(display_name: impl Into<String>, issue: AttributeIssue) -> Self {
        Self {
            display_name: display_name.into(),
            outcome: ReadingOutcome::Unavailable { issue },
        }
    }

    /// The measured value; `None` when unavailable, even if a zero is displayed.
    pub fn value(&self) -> Option<f64> {
        match self.outcome {
            ReadingOutcome::Measured { value, .. } => Some(value),
            ReadingOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.value().is_some()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        match &self.outcome {
            ReadingOutcome::Measured {
                timestamp: Some(ts),
                ..
            } => DateTime::parse_from_rfc3339(ts)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Active,
    Inactive,
}

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Good,
    Warning,
    Alert,
}

impl Thresholds {
    /// Severity implied by a unit's readings; unavailable readings never escalate.
    pub fn evaluate(&self, readings: &BTreeMap<String, Reading>) -> Severity {
        let value = |key: &str| readings.get(key).and_then(Reading::value);
        let mut severity = Severity::Good;

        if let Some(water_cut) = value(keys::WATER_CUT) {
            if water_cut >= self.water_cut_alert {
                severity = severity.max(Severity::Alert);
            } else if water_cut >= self.water_cut_warning {
                severity = severity.max(Severity::Warning);
            }
        }
        if let Some(pressure) = value(keys::TUBING_PRESSURE) {
            if self.tubing_pressure_alert.is_some_and(|limit| pressure >= limit) {
                severity = severity.max(Severity::Alert);
            } else if self.tubing_pressure_warning.is_some_and(|limit| pressure >= limit) {
                severity = severity.max(Severity::Warning);
            }
        }
        severity
    }
}

/// One leaf node (a well) with its resolved metrics.
///
/// `readings` is keyed by canonical key and keeps the measured/unavailable
/// distinction; `attributes` is the display view keyed by configured display
/// name, where unavailable readings show as 0. Both hold exactly one entry per
/// configured mapping key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitRecord {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    status: UnitStatus,
    pub severity: Severity,
    pub attributes: BTreeMap<String, f64>,
    pub readings: BTreeMap<String, Reading>,
    pub last_updated: DateTime<Utc>,
}

impl UnitRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        path: Option<String>,
        readings: BTreeMap<String, Reading>,
        thresholds: &Thresholds,
    ) -> Self {
        let attributes = readings
            .values()
            .map(|r| (r.display_name.clone(), r.value().unwrap_or(0.0)))
            .collect();
        let status = match readings.get(keys::OIL_RATE).and_then(Reading::value) {
            Some(rate) if rate != 0.0 => UnitStatus::Active,
            _ => UnitStatus::Inactive,
        };
        let severity = thresholds.evaluate(&readings);
        let last_updated = readings
            .values()
            .filter_map(Reading::timestamp)
            .max()
            .unwrap_or_else(Utc::now);

        Self {
            id: id.into(),
            name: name.into(),
            path,
            status,
            severity,
            attributes,
            readings,
            last_updated,
        }
    }

    /// Replaces the status derived from `oilRate`.
    ///
    /// For units known to be shut in (or producing) from a source other than
    /// their readings, e.g. a downtime log; aggregates follow this status.
    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == UnitStatus::Active
    }

    /// Measured value of a canonical key.
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.readings.get(key).and_then(Reading::value)
    }

    pub fn unavailable_keys(&self) -> impl Iterator<Item = (&str, &Reading)> {
        self.readings
            .iter()
            .filter(|(_, r)| !r.is_available())
            .map(|(k, r)| (k.as_str(), r))
    }
}

/// A group of units (a well pad) and the summaries derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub units: Vec<UnitRecord>,
    pub aggregates: GroupAggregates,
    pub status: Severity,
}

impl GroupRecord {
    /// Aggregates and status are always computed here, from `units`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        location: Option<String>,
        units: Vec<UnitRecord>,
    ) -> Self {
        let aggregates = aggregator::aggregate(&units);
        let status = aggregator::escalate(&units);
        Self {
            id: id.into(),
            name: name.into(),
            location,
            units,
            aggregates,
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Synthetic,
}

/// What a caller gets back from one load, live or not.
#[derive(Debug, Clone, Serialize)]
pub struct LoadResult {
    pub groups: Vec<GroupRecord>,
    pub provenance: Provenance,
    /// Why the live path was abandoned
    pub diagnostics: Option<DiscoveryError>,
    /// Base URL used by a live load
    pub endpoint: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl LoadResult {
    pub fn live(groups: Vec<GroupRecord>, endpoint: String) -> Self {
        Self {
            groups,
            provenance: Provenance::Live,
            diagnostics: None,
            endpoint: Some(endpoint),
            generated_at: Utc::now(),
        }
    }

    pub fn synthetic(groups: Vec<GroupRecord>, cause: DiscoveryError) -> Self {
        Self {
            groups,
            provenance: Provenance::Synthetic,
            diagnostics: Some(cause),
            endpoint: None,
            generated_at: Utc::now(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.provenance == Provenance::Live
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitRecord> {
        self.groups.iter().flat_map(|g| g.units.iter())
    }
}
