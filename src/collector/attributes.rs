use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::types::{Reading, ReadingOutcome, UnitRecord};
use crate::client::models::WireAttribute;
use crate::client::{ApiSession, AssetNode, AttributeDescriptor, AttributeValue};
use crate::config::settings::Thresholds;
use crate::config::AttributeMapping;
use crate::error::{AttributeIssue, DiscoveryError, Result, TransportError};

/// Reduces a wire value to a number.
///
/// A container object carrying its own `Value` is unwrapped once; deeper
/// nesting is not followed.
pub fn reduce_value(raw: &Value) -> std::result::Result<f64, AttributeIssue> {
    reduce(raw, 0)
}

fn reduce(raw: &Value, depth: usize) -> std::result::Result<f64, AttributeIssue> {
    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| AttributeIssue::ParseFailure {
            raw: n.to_string(),
        }),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(AttributeIssue::ParseFailure { raw: s.clone() }),
        },
        Value::Null => Err(AttributeIssue::NullValue),
        Value::Object(map) if depth == 0 => match map.get("Value") {
            Some(inner) => reduce(inner, depth + 1),
            None => Err(AttributeIssue::Unsupported {
                type_name: "object".into(),
            }),
        },
        Value::Object(_) => Err(AttributeIssue::Unsupported {
            type_name: "nested object".into(),
        }),
        Value::Bool(_) => Err(AttributeIssue::Unsupported {
            type_name: "bool".into(),
        }),
        Value::Array(_) => Err(AttributeIssue::Unsupported {
            type_name: "array".into(),
        }),
    }
}

/// Turns element nodes into unit records through an attribute mapping.
///
/// Only a credential rejection fails a unit; anything else leaves the
/// affected keys unavailable.
#[derive(Clone)]
pub struct AttributeResolver {
    session: ApiSession,
    thresholds: Thresholds,
}

impl AttributeResolver {
    pub fn new(session: ApiSession, thresholds: Thresholds) -> Self {
        Self {
            session,
            thresholds,
        }
    }

    pub async fn resolve(&self, node: &AssetNode, mapping: &AttributeMapping) -> Result<UnitRecord> {
        let descriptors = match self.descriptors(node).await {
            Ok(descriptors) => Ok(descriptors),
            Err(e) if e.is_auth_required() => return Err(e.into()),
            Err(e) => {
                warn!(unit = %node.name, error = %e, "attribute listing failed");
                Err(e)
            }
        };

        let mut readings = BTreeMap::new();
        match descriptors {
            Ok(descriptors) => {
                let mut index: HashMap<String, &AttributeDescriptor> = HashMap::new();
                for descriptor in &descriptors {
                    index.entry(descriptor.name.to_lowercase()).or_insert(descriptor);
                }
                for (key, display_name) in mapping.iter() {
                    let reading = match index.get(&display_name.to_lowercase()) {
                        Some(descriptor) => self.read(descriptor, display_name).await?,
                        None => Reading::unavailable(
                            display_name,
                            AttributeIssue::NotDeclared {
                                display_name: display_name.to_string(),
                            },
                        ),
                    };
                    if let ReadingOutcome::Unavailable { issue } = &reading.outcome {
                        debug!(unit = %node.name, key, %issue, "reading unavailable");
                    }
                    readings.insert(key.to_string(), reading);
                }
            }
            Err(error) => {
                for (key, display_name) in mapping.iter() {
                    let issue = AttributeIssue::FetchFailed {
                        error: error.clone(),
                    };
                    readings.insert(key.to_string(), Reading::unavailable(display_name, issue));
                }
            }
        }

        Ok(UnitRecord::new(
            node.id.clone(),
            node.name.clone(),
            node.path.clone(),
            readings,
            &self.thresholds,
        ))
    }

    /// Resolves every node with at most `workers` units in flight.
    ///
    /// Output order follows input order. The first credential rejection, or a
    /// unit task that dies, aborts the remaining units.
    pub async fn resolve_all(
        &self,
        nodes: Vec<AssetNode>,
        mapping: Arc<AttributeMapping>,
        workers: usize,
    ) -> Result<Vec<UnitRecord>> {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut slots: Vec<Option<UnitRecord>> = vec![None; nodes.len()];
        let mut tasks = JoinSet::new();

        for (index, node) in nodes.into_iter().enumerate() {
            let resolver = self.clone();
            let mapping = Arc::clone(&mapping);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, resolver.resolve(&node, &mapping).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(unit))) => slots[index] = Some(unit),
                Ok((_, Err(e))) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    warn!(error = %e, "unit task did not complete");
                    return Err(DiscoveryError::Transport {
                        error: TransportError::Other {
                            url: self.session.base_url().to_string(),
                            message: format!("unit task failed: {e}"),
                        },
                    });
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    async fn descriptors(&self, node: &AssetNode) -> std::result::Result<Vec<AttributeDescriptor>, TransportError> {
        let Some(endpoint) = node.attributes_endpoint() else {
            return Ok(Vec::new());
        };
        let items: Vec<WireAttribute> = self.session.list(&endpoint).await?;
        Ok(items.into_iter().filter_map(AttributeDescriptor::from_wire).collect())
    }

    async fn read(&self, descriptor: &AttributeDescriptor, display_name: &str) -> Result<Reading> {
        let value: AttributeValue = match self.session.get_as(&descriptor.value_link).await {
            Ok(value) => value,
            Err(e) if e.is_auth_required() => return Err(DiscoveryError::from(e)),
            Err(error) => {
                return Ok(Reading::unavailable(display_name, AttributeIssue::FetchFailed { error }))
            }
        };
        if !value.errors.is_empty() {
            debug!(attribute = %descriptor.name, errors = ?value.errors, "value carries errors");
        }

        Ok(match reduce_value(&value.value) {
            Ok(number) => Reading {
                display_name: display_name.to_string(),
                outcome: ReadingOutcome::Measured {
                    value: number,
                    quality_good: value.good,
                    questionable: value.questionable,
                    timestamp: value.timestamp,
                },
            },
            Err(issue) => Reading::unavailable(display_name, issue),
        })
    }
}
