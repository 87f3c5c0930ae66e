use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub mod aggregator;
pub mod attributes;
pub mod navigator;
pub mod template;
pub mod types;

pub use aggregator::GroupAggregates;
pub use attributes::{reduce_value, AttributeResolver};
pub use navigator::{Navigator, Target, MAX_DEPTH};
pub use template::filter_by_template;
pub use types::{
    GroupRecord, LoadResult, Provenance, Reading, ReadingOutcome, Severity, UnitRecord, UnitStatus,
};

use crate::client::{ApiSession, Credentials, EndpointResolver, HttpTransport, Transport};
use crate::config::{AttributeMapping, ServerConfig, Settings};
use crate::error::{DiscoveryError, Result};
use crate::synthetic::SyntheticGenerator;

/// A group resolved from the live API and the endpoint it came from.
#[derive(Debug, Clone)]
pub struct LiveLoad {
    pub group: GroupRecord,
    pub endpoint: String,
}

/// Runs discovery against the remote API and falls back to synthetic data.
///
/// Holds no state between runs: each run resolves its own endpoint and keeps
/// it in a run-local [`ApiSession`].
pub struct Collector {
    transport: Arc<dyn Transport>,
    settings: Settings,
}

impl Collector {
    pub fn new(transport: Arc<dyn Transport>, settings: Settings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Collector over the HTTP transport configured by `settings`.
    pub fn http(settings: Settings) -> reqwest::Result<Self> {
        let credentials = Credentials::from(&settings.auth);
        let transport = HttpTransport::new(&settings.connection, credentials)?;
        Ok(Self::new(Arc::new(transport), settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Loads groups for `server`; never fails.
    ///
    /// Any live failure, cancellation, or deadline expiry discards partial
    /// results and returns synthetic groups with the cause attached.
    pub async fn load_groups(
        &self,
        server: &ServerConfig,
        mapping: &AttributeMapping,
        cancel: CancellationToken,
    ) -> LoadResult {
        let live = with_deadline(self.settings.connection.run_deadline(), self.discover(server, mapping));
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DiscoveryError::Cancelled),
            result = live => result,
        };

        match outcome {
            Ok(load) => {
                info!(
                    endpoint = %load.endpoint,
                    group = %load.group.name,
                    units = load.group.units.len(),
                    active = load.group.aggregates.active_units,
                    "live load complete"
                );
                LoadResult::live(vec![load.group], load.endpoint)
            }
            Err(cause) => {
                warn!(error = %cause, "live load failed, serving synthetic data");
                LoadResult::synthetic(self.synthesize(mapping), cause)
            }
        }
    }

    /// The live pipeline: resolve, navigate, filter, resolve attributes, aggregate.
    pub async fn discover(&self, server: &ServerConfig, mapping: &AttributeMapping) -> Result<LiveLoad> {
        let connection = &self.settings.connection;
        let endpoint = EndpointResolver::new(Arc::clone(&self.transport), connection.probe_timeout())
            .resolve(&server.api_host_name)
            .await?;
        if endpoint.auth_challenge {
            info!(base_url = %endpoint.base_url, "endpoint answered with a credential challenge");
        }

        let session = ApiSession::new(
            Arc::clone(&self.transport),
            endpoint.base_url.clone(),
            connection.request_timeout(),
        );
        let target = Navigator::new(&session)
            .find_target_children(&server.server_name, &server.database_name, &server.parent_path)
            .await?;

        let listed = target.children.len();
        let nodes = filter_by_template(target.children, server.template_filter.as_deref());
        info!(
            parent = %target.parent.name,
            listed,
            selected = nodes.len(),
            template = server.template_filter.as_deref().unwrap_or("*"),
            "units selected"
        );

        let resolver = AttributeResolver::new(session, self.settings.thresholds.clone());
        let units = resolver
            .resolve_all(nodes, Arc::new(mapping.clone()), self.settings.collection.workers())
            .await?;

        let unavailable: usize = units.iter().map(|u| u.unavailable_keys().count()).sum();
        if unavailable > 0 {
            warn!(unavailable, "some configured attributes had no usable value");
        }

        let name = server
            .group_name
            .clone()
            .unwrap_or_else(|| target.parent.name.clone());
        let group = GroupRecord::new(target.parent.id, name, server.location.clone(), units);
        Ok(LiveLoad {
            group,
            endpoint: endpoint.base_url,
        })
    }

    pub fn synthesize(&self, mapping: &AttributeMapping) -> Vec<GroupRecord> {
        SyntheticGenerator::new(&self.settings.synthetic, self.settings.thresholds.clone())
            .generate(mapping)
    }
}

async fn with_deadline<T>(deadline: Option<Duration>, run: impl Future<Output = Result<T>>) -> Result<T> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .unwrap_or(Err(DiscoveryError::DeadlineExceeded {
                seconds: limit.as_secs(),
            })),
        None => run.await,
    }
}
