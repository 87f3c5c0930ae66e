use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical metric keys with a fixed meaning in aggregation and status.
///
/// Any other key in a mapping is an extended key: it is resolved and reported
/// like the others but takes no part in group formulas.
pub mod keys {
    pub const OIL_RATE: &str = "oilRate";
    pub const LIQUID_RATE: &str = "liquidRate";
    pub const WATER_RATE: &str = "waterRate";
    pub const GAS_RATE: &str = "gasRate";
    pub const WATER_CUT: &str = "waterCut";
    pub const TUBING_PRESSURE: &str = "tubingPressure";
    pub const CASING_PRESSURE: &str = "casingPressure";
    pub const ESP_FREQUENCY: &str = "espFrequency";
    pub const MOTOR_TEMPERATURE: &str = "motorTemperature";
}

/// Canonical key → site-specific attribute display name.
///
/// Entries whose display name is null or blank in the source document are
/// dropped on load: an unconfigured key is absent, never defaulted.
/// A display name belongs to one key only, compared case-insensitively; a
/// document mapping two keys to the same name is rejected.
/// Iteration is ordered by canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Option<String>>",
    into = "BTreeMap<String, String>"
)]
pub struct AttributeMapping {
    entries: BTreeMap<String, String>,
}

impl TryFrom<BTreeMap<String, Option<String>>> for AttributeMapping {
    type Error = String;

    fn try_from(raw: BTreeMap<String, Option<String>>) -> Result<Self, Self::Error> {
        let mut mapping = Self::default();
        for (key, name) in raw {
            let Some(name) = name else { continue };
            if let Some(owner) = mapping.owner_of(&name) {
                return Err(format!(
                    "display name '{}' is mapped by both '{}' and '{}'",
                    name.trim(),
                    owner,
                    key.trim()
                ));
            }
            mapping.insert(key, name);
        }
        Ok(mapping)
    }
}

impl From<AttributeMapping> for BTreeMap<String, String> {
    fn from(mapping: AttributeMapping) -> Self {
        mapping.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::default();
        for (key, name) in iter {
            mapping.insert(key, name);
        }
        mapping
    }
}

impl AttributeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry and reports whether it was kept.
    ///
    /// Blank keys or names are ignored, and so is a display name another key
    /// already owns.
    pub fn insert(&mut self, key: impl Into<String>, display_name: impl Into<String>) -> bool {
        let key = key.into().trim().to_string();
        let display_name = display_name.into().trim().to_string();
        if key.is_empty() || display_name.is_empty() {
            return false;
        }
        if self.owner_of(&display_name).is_some_and(|owner| owner != key) {
            return false;
        }
        self.entries.insert(key, display_name);
        true
    }

    pub fn with(mut self, key: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.insert(key, display_name);
        self
    }

    pub fn display_name(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The key whose display name matches `display_name`, ignoring case.
    fn owner_of(&self, display_name: &str) -> Option<&str> {
        let wanted = display_name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(_, name)| name.to_lowercase() == wanted)
            .map(|(key, _)| key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_blank_names_are_absent() {
        let yaml = "oilRate: Oil Rate\nwaterCut: ~\ngasRate: '  '\ntubingPressure: THP\n";
        let mapping: AttributeMapping = serde_yml::from_str(yaml).unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.display_name(keys::OIL_RATE), Some("Oil Rate"));
        assert_eq!(mapping.display_name(keys::TUBING_PRESSURE), Some("THP"));
        assert!(!mapping.contains(keys::WATER_CUT));
        assert!(!mapping.contains(keys::GAS_RATE));
    }

    #[test]
    fn iteration_is_ordered_by_key() {
        let mapping = AttributeMapping::new()
            .with("waterCut", "WC")
            .with("chokeSize", "Choke")
            .with("oilRate", "Oil");
        let keys: Vec<&str> = mapping.keys().collect();
        assert_eq!(keys, vec!["chokeSize", "oilRate", "waterCut"]);
    }

    #[test]
    fn shared_display_name_is_refused() {
        let mut mapping = AttributeMapping::new().with("oilRate", "Rate");
        assert!(!mapping.insert("liquidRate", "rate"));
        assert!(mapping.insert("oilRate", "Oil Rate"));
        assert!(mapping.insert("liquidRate", "Rate"));

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.display_name("liquidRate"), Some("Rate"));
    }

    #[test]
    fn document_with_shared_display_name_is_rejected() {
        let yaml = "oilRate: Rate\nliquidRate: ' rate '\nwaterCut: WC\n";
        let err = serde_yml::from_str::<AttributeMapping>(yaml).unwrap_err();
        assert!(err.to_string().contains("is mapped by both 'liquidRate' and 'oilRate'"), "{err}");
    }
}
