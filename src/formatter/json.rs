use serde::Serialize;

use crate::collector::{GroupRecord, LoadResult, Provenance, ReadingOutcome};

/// JSON document handed to the route layer / UI.
#[derive(Debug, Clone, Serialize)]
pub struct LoadResultJson<'a> {
    pub provenance: Provenance,
    pub generated_at: String,
    pub endpoint: Option<&'a str>,
    pub summary: ResultSummary,
    pub groups: &'a [GroupRecord],
    pub errors: Vec<ErrorInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub total_groups: usize,
    pub total_units: usize,
    pub active_units: usize,
    pub total_readings: usize,
    pub unavailable_readings: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// "run" for the cause of a fallback, "reading" for a unit attribute
    pub item_type: String,
    pub item_name: String,
    pub error_message: String,
}

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_load_result(result: &LoadResult) -> LoadResultJson<'_> {
        let units: Vec<_> = result.units().collect();
        let total_readings = units.iter().map(|u| u.readings.len()).sum();
        let unavailable_readings = units.iter().map(|u| u.unavailable_keys().count()).sum();

        let summary = ResultSummary {
            total_groups: result.groups.len(),
            total_units: units.len(),
            active_units: units.iter().filter(|u| u.is_active()).count(),
            total_readings,
            unavailable_readings,
        };

        LoadResultJson {
            provenance: result.provenance,
            generated_at: result.generated_at.to_rfc3339(),
            endpoint: result.endpoint.as_deref(),
            summary,
            groups: &result.groups,
            errors: Self::extract_errors(result),
        }
    }

    fn extract_errors(result: &LoadResult) -> Vec<ErrorInfo> {
        let mut errors = Vec::new();

        if let Some(cause) = &result.diagnostics {
            errors.push(ErrorInfo {
                item_type: "run".to_string(),
                item_name: "discovery".to_string(),
                error_message: cause.to_string(),
            });
        }

        for unit in result.units() {
            for (key, reading) in unit.unavailable_keys() {
                if let ReadingOutcome::Unavailable { issue } = &reading.outcome {
                    errors.push(ErrorInfo {
                        item_type: "reading".to_string(),
                        item_name: format!("{}/{}", unit.name, key),
                        error_message: issue.to_string(),
                    });
                }
            }
        }

        errors
    }

    pub fn to_json_string(result: &LoadResult) -> anyhow::Result<String> {
        let json_result = Self::format_load_result(result);
        serde_json::to_string_pretty(&json_result)
            .map_err(|e| anyhow::anyhow!("Failed to serialize load result: {}", e))
    }

    pub fn to_json_compact(result: &LoadResult) -> anyhow::Result<String> {
        let json_result = Self::format_load_result(result);
        serde_json::to_string(&json_result)
            .map_err(|e| anyhow::anyhow!("Failed to serialize load result: {}", e))
    }
}
