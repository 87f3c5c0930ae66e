//! Fallback data shaped exactly like a live load.
//!
//! Units carry one reading per mapping entry and go through the same
//! [`UnitRecord`]/[`GroupRecord`] constructors as live data, so aggregates and
//! status follow the same rules. Distributions:
//!
//! | quantity           | distribution                         |
//! |--------------------|--------------------------------------|
//! | unit count         | uniform 8..=24, groups of `group_size` |
//! | inactive share     | 15 % (oil rate 0)                    |
//! | `oilRate`          | U(50, 450)                           |
//! | `waterCut` (%)     | U(10, 95)                            |
//! | `liquidRate`       | oil / (1 - waterCut/100)             |
//! | `waterRate`        | liquid - oil                         |
//! | `gasRate`          | U(100, 1200)                         |
//! | `tubingPressure`   | U(120, 380)                          |
//! | `casingPressure`   | U(300, 900)                          |
//! | `espFrequency`     | U(40, 60)                            |
//! | `motorTemperature` | U(150, 260)                          |
//! | any other key      | U(0, 100)                            |

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::collector::types::{GroupRecord, Reading, UnitRecord};
use crate::config::keys;
use crate::config::settings::{SyntheticSettings, Thresholds};
use crate::config::AttributeMapping;

pub const UNIT_COUNT: RangeInclusive<usize> = 8..=24;
pub const INACTIVE_SHARE: f64 = 0.15;

/// Per-unit draws; every mapped key is derived from these.
struct WellSample {
    oil_rate: f64,
    water_cut: f64,
    gas_rate: f64,
    tubing_pressure: f64,
    casing_pressure: f64,
    esp_frequency: f64,
    motor_temperature: f64,
}

impl WellSample {
    fn draw(rng: &mut StdRng) -> Self {
        let active = !rng.gen_bool(INACTIVE_SHARE);
        Self {
            oil_rate: if active { rng.gen_range(50.0..450.0) } else { 0.0 },
            water_cut: rng.gen_range(10.0..95.0),
            gas_rate: rng.gen_range(100.0..1200.0),
            tubing_pressure: rng.gen_range(120.0..380.0),
            casing_pressure: rng.gen_range(300.0..900.0),
            esp_frequency: rng.gen_range(40.0..60.0),
            motor_temperature: rng.gen_range(150.0..260.0),
        }
    }

    fn liquid_rate(&self) -> f64 {
        self.oil_rate / (1.0 - self.water_cut / 100.0)
    }

    fn value_for(&self, key: &str, rng: &mut StdRng) -> f64 {
        let value = match key {
            keys::OIL_RATE => self.oil_rate,
            keys::WATER_CUT => self.water_cut,
            keys::LIQUID_RATE => self.liquid_rate(),
            keys::WATER_RATE => self.liquid_rate() - self.oil_rate,
            keys::GAS_RATE => self.gas_rate,
            keys::TUBING_PRESSURE => self.tubing_pressure,
            keys::CASING_PRESSURE => self.casing_pressure,
            keys::ESP_FREQUENCY => self.esp_frequency,
            keys::MOTOR_TEMPERATURE => self.motor_temperature,
            _ => rng.gen_range(0.0..100.0),
        };
        round2(value)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct SyntheticGenerator {
    rng: StdRng,
    group_size: usize,
    thresholds: Thresholds,
}

impl SyntheticGenerator {
    pub fn new(settings: &SyntheticSettings, thresholds: Thresholds) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            group_size: settings.group_size.max(1),
            thresholds,
        }
    }

    pub fn generate(&mut self, mapping: &AttributeMapping) -> Vec<GroupRecord> {
        let unit_count = self.rng.gen_range(UNIT_COUNT);
        let units: Vec<UnitRecord> = (1..=unit_count).map(|n| self.unit(n, mapping)).collect();

        let mut groups = Vec::new();
        let mut remaining = units.into_iter().peekable();
        let mut index = 1;
        while remaining.peek().is_some() {
            let batch: Vec<UnitRecord> = remaining.by_ref().take(self.group_size).collect();
            groups.push(GroupRecord::new(
                format!("PAD-{index:02}"),
                format!("Pad {index:02}"),
                None,
                batch,
            ));
            index += 1;
        }
        groups
    }

    fn unit(&mut self, n: usize, mapping: &AttributeMapping) -> UnitRecord {
        let sample = WellSample::draw(&mut self.rng);
        let readings: BTreeMap<String, Reading> = mapping
            .iter()
            .map(|(key, display_name)| {
                let value = sample.value_for(key, &mut self.rng);
                (key.to_string(), Reading::measured(display_name, value))
            })
            .collect();
        UnitRecord::new(
            format!("WELL-{n:03}"),
            format!("Well {n:03}"),
            None,
            readings,
            &self.thresholds,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::UnitStatus;

    fn seeded(seed: u64) -> SyntheticGenerator {
        let settings = SyntheticSettings {
            seed: Some(seed),
            group_size: 6,
        };
        SyntheticGenerator::new(&settings, Thresholds::default())
    }

    #[test]
    fn units_carry_exactly_the_mapped_display_names() {
        let mapping = AttributeMapping::new().with("oilRate", "X").with("waterCut", "Y");
        for seed in 0..20 {
            for group in seeded(seed).generate(&mapping) {
                for unit in &group.units {
                    let keys: Vec<&str> = unit.attributes.keys().map(String::as_str).collect();
                    assert_eq!(keys, vec!["X", "Y"]);
                    assert!(unit.attributes.values().all(|v| v.is_finite()));
                    assert_eq!(unit.readings.len(), 2);
                }
            }
        }
    }

    #[test]
    fn one_attribute_per_mapping_entry_when_names_collide() {
        let mut mapping = AttributeMapping::new().with("oilRate", "Rate");
        mapping.insert("liquidRate", "Rate");
        for group in seeded(9).generate(&mapping) {
            for unit in &group.units {
                assert_eq!(unit.attributes.len(), mapping.len());
                assert_eq!(unit.readings.len(), mapping.len());
                assert_eq!(unit.attributes["Rate"], unit.metric("oilRate").unwrap());
            }
        }
    }

    #[test]
    fn unit_count_and_batching_follow_distribution() {
        let mapping = AttributeMapping::new().with("oilRate", "Oil");
        for seed in 0..50 {
            let groups = seeded(seed).generate(&mapping);
            let total: usize = groups.iter().map(|g| g.units.len()).sum();
            assert!(UNIT_COUNT.contains(&total));
            let (last, full) = groups.split_last().unwrap();
            assert!(full.iter().all(|g| g.units.len() == 6));
            assert!((1..=6).contains(&last.units.len()));
        }
    }

    #[test]
    fn same_seed_same_output() {
        let mapping = AttributeMapping::new()
            .with("oilRate", "Oil")
            .with("liquidRate", "Liquid")
            .with("chokeSize", "Choke");
        let a = seeded(7).generate(&mapping);
        let b = seeded(7).generate(&mapping);
        let values = |groups: &[GroupRecord]| -> Vec<f64> {
            groups
                .iter()
                .flat_map(|g| g.units.iter())
                .flat_map(|u| u.attributes.values().copied())
                .collect()
        };
        assert_eq!(values(&a), values(&b));
    }

    #[test]
    fn aggregates_match_live_formulas() {
        let mapping = AttributeMapping::new()
            .with("oilRate", "Oil")
            .with("liquidRate", "Liquid")
            .with("waterCut", "WC");
        let groups = seeded(3).generate(&mapping);
        for group in &groups {
            let expected: f64 = group
                .units
                .iter()
                .filter(|u| u.status() == UnitStatus::Active)
                .filter_map(|u| u.metric("oilRate"))
                .sum();
            assert!((group.aggregates.total_oil_rate - expected).abs() < 1e-9);
            assert_eq!(group.aggregates.unit_count, group.units.len());
            for unit in &group.units {
                let oil = unit.metric("oilRate").unwrap();
                let liquid = unit.metric("liquidRate").unwrap();
                assert!(liquid + 0.01 >= oil);
                assert!((50.0..=450.0).contains(&oil) || oil == 0.0);
            }
        }
    }
}
