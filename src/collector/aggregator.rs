//! Group summaries folded from unit records.
//!
//! Rates are summed and pressures/ratios averaged over active units only.
//! An empty active set yields zeros, never NaN.

use serde::Serialize;

use super::types::{Severity, UnitRecord};
use crate::config::keys;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupAggregates {
    pub total_oil_rate: f64,
    pub total_liquid_rate: f64,
    pub total_water_rate: f64,
    pub total_gas_rate: f64,
    pub avg_water_cut: f64,
    pub avg_tubing_pressure: f64,
    pub avg_casing_pressure: f64,
    pub active_units: usize,
    pub unit_count: usize,
}

pub fn aggregate(units: &[UnitRecord]) -> GroupAggregates {
    let active: Vec<&UnitRecord> = units.iter().filter(|u| u.is_active()).collect();

    GroupAggregates {
        total_oil_rate: sum(&active, keys::OIL_RATE),
        total_liquid_rate: sum(&active, keys::LIQUID_RATE),
        total_water_rate: active.iter().map(|u| water_rate(u)).sum(),
        total_gas_rate: sum(&active, keys::GAS_RATE),
        avg_water_cut: mean(&active, keys::WATER_CUT),
        avg_tubing_pressure: mean(&active, keys::TUBING_PRESSURE),
        avg_casing_pressure: mean(&active, keys::CASING_PRESSURE),
        active_units: active.len(),
        unit_count: units.len(),
    }
}

/// Worst unit severity in the group.
pub fn escalate(units: &[UnitRecord]) -> Severity {
    units
        .iter()
        .map(|u| u.severity)
        .max()
        .unwrap_or(Severity::Good)
}

fn sum(units: &[&UnitRecord], key: &str) -> f64 {
    units.iter().filter_map(|u| u.metric(key)).sum()
}

fn mean(units: &[&UnitRecord], key: &str) -> f64 {
    let values: Vec<f64> = units.iter().filter_map(|u| u.metric(key)).collect();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Liquid minus oil when both are measured, else a measured water rate.
fn water_rate(unit: &UnitRecord) -> f64 {
    match (unit.metric(keys::LIQUID_RATE), unit.metric(keys::OIL_RATE)) {
        (Some(liquid), Some(oil)) => (liquid - oil).max(0.0),
        _ => unit.metric(keys::WATER_RATE).unwrap_or(0.0),
    }
}
