//! Walks server → database → element path to the parent of the units.
//!
//! Names match exactly, ignoring case. Every lookup failure carries the
//! names that did exist at that level.

use tracing::debug;

use crate::client::models::WireNode;
use crate::client::{ApiSession, AssetNode, Endpoint, NodeKind};
use crate::config::profile::split_path;
use crate::error::{DiscoveryError, NotFoundKind, Result};

/// Most path segments a walk will follow.
pub const MAX_DEPTH: usize = 10;

/// The node a path names and its children.
#[derive(Debug, Clone)]
pub struct Target {
    pub parent: AssetNode,
    pub children: Vec<AssetNode>,
}

pub struct Navigator<'a> {
    session: &'a ApiSession,
}

impl<'a> Navigator<'a> {
    pub fn new(session: &'a ApiSession) -> Self {
        Self { session }
    }

    pub async fn find_target_children(&self, server: &str, database: &str, path: &str) -> Result<Target> {
        let segments = split_path(path);
        if segments.len() > MAX_DEPTH {
            return Err(DiscoveryError::DepthExceeded {
                segments: segments.len(),
                max: MAX_DEPTH,
            });
        }

        let servers = self
            .list(&Endpoint::Relative("assetservers".into()), NodeKind::Server)
            .await?;
        let server_node = pick(&servers, server, NotFoundKind::Server)?;

        let databases = self.children(server_node).await?;
        let database_node = pick(&databases, database, NotFoundKind::Database)?;

        let mut parent = database_node.clone();
        let mut current = self.children(&parent).await?;

        for segment in segments {
            let next = pick(&current, segment, NotFoundKind::PathSegment)?.clone();
            debug!(segment, id = %next.id, "descending");
            current = self.children(&next).await?;
            parent = next;
        }

        Ok(Target {
            parent,
            children: current,
        })
    }

    async fn children(&self, node: &AssetNode) -> Result<Vec<AssetNode>> {
        self.list(&node.children_endpoint(), node.kind.child_kind()).await
    }

    async fn list(&self, endpoint: &Endpoint, kind: NodeKind) -> Result<Vec<AssetNode>> {
        let items: Vec<WireNode> = self.session.list(endpoint).await?;
        Ok(items
            .into_iter()
            .filter_map(|wire| AssetNode::from_wire(wire, kind))
            .collect())
    }
}

fn pick<'n>(nodes: &'n [AssetNode], name: &str, kind: NotFoundKind) -> Result<&'n AssetNode> {
    let wanted = name.trim().to_lowercase();
    nodes
        .iter()
        .find(|n| n.name.trim().to_lowercase() == wanted)
        .ok_or_else(|| DiscoveryError::NotFound {
            kind,
            name: name.to_string(),
            available_names: nodes.iter().map(|n| n.name.clone()).collect(),
        })
}

#[cfg(test)]
pub(crate) mod fixture {
    //! A small tree served by [`MockTransport`].

    use crate::client::mock::MockTransport;
    use serde_json::json;

    pub const BASE: &str = "https://pi/piwebapi";

    pub fn tree() -> MockTransport {
        MockTransport::new()
            .json(
                &format!("{BASE}/assetservers"),
                json!({"Items": [
                    {"Name": "S0", "WebId": "srv0"},
                    {"Name": "S1", "WebId": "srv1"}
                ]}),
            )
            .json(
                &format!("{BASE}/assetservers/srv1/assetdatabases"),
                json!({"Items": [{"Name": "DB1", "WebId": "db1"}]}),
            )
            .json(
                &format!("{BASE}/assetdatabases/db1/elements"),
                json!({"Items": [
                    {"Name": "Area", "WebId": "area"},
                    {"Name": "Utilities", "WebId": "util"}
                ]}),
            )
            .json(
                &format!("{BASE}/elements/area/elements"),
                json!({"Items": [
                    {"Name": "PadB", "WebId": "padb", "TemplateName": "WellPad"},
                    {"Name": "PadC", "WebId": "padc", "TemplateName": "WellPad"}
                ]}),
            )
            .json(
                &format!("{BASE}/elements/padb/elements"),
                json!({"Items": [
                    {"Name": "W1", "WebId": "w1", "TemplateName": "Well"},
                    {"Name": "Sep", "WebId": "sep", "TemplateName": "Separator"},
                    {"Name": "W2", "WebId": "w2", "TemplateName": "Well"}
                ]}),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::{self, BASE};
    use super::*;
    use crate::error::TransportError;
    use std::sync::Arc;
    use std::time::Duration;

    fn session(transport: crate::client::mock::MockTransport) -> ApiSession {
        ApiSession::new(Arc::new(transport), BASE, Duration::from_secs(1))
    }

    fn names(nodes: &[AssetNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[tokio::test]
    async fn walks_to_children_of_last_segment() {
        let session = session(fixture::tree());
        let nav = Navigator::new(&session);
        let target = nav.find_target_children("s1", "db1", r"Area\PadB").await.unwrap();
        assert_eq!(target.parent.name, "PadB");
        assert_eq!(names(&target.children), vec!["W1", "Sep", "W2"]);

        let again = nav.find_target_children("S1", "DB1", "area/padb/").await.unwrap();
        assert_eq!(again.children, target.children);
    }

    #[tokio::test]
    async fn empty_path_returns_database_roots() {
        let session = session(fixture::tree());
        let target = Navigator::new(&session)
            .find_target_children("S1", "DB1", "")
            .await
            .unwrap();
        assert_eq!(target.parent.kind, NodeKind::Database);
        assert_eq!(names(&target.children), vec!["Area", "Utilities"]);
    }

    #[tokio::test]
    async fn missing_segment_reports_siblings() {
        let session = session(fixture::tree());
        let err = Navigator::new(&session)
            .find_target_children("S1", "DB1", r"Area\PadA")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::NotFound {
                kind: NotFoundKind::PathSegment,
                name: "PadA".into(),
                available_names: vec!["PadB".into(), "PadC".into()],
            }
        );
    }

    #[tokio::test]
    async fn missing_server_and_database_report_available_names() {
        let session = session(fixture::tree());
        let nav = Navigator::new(&session);

        match nav.find_target_children("S", "DB1", "").await {
            Err(DiscoveryError::NotFound {
                kind: NotFoundKind::Server,
                available_names,
                ..
            }) => assert_eq!(available_names, vec!["S0", "S1"]),
            other => panic!("unexpected {other:?}"),
        }
        match nav.find_target_children("S1", "DB2", "").await {
            Err(DiscoveryError::NotFound {
                kind: NotFoundKind::Database,
                available_names,
                ..
            }) => assert_eq!(available_names, vec!["DB1"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn overlong_path_is_rejected_before_any_request() {
        let transport = Arc::new(fixture::tree());
        let session = ApiSession::new(transport.clone(), BASE, Duration::from_secs(1));
        let path = (0..11).map(|i| format!("L{i}")).collect::<Vec<_>>().join("\\");
        let err = Navigator::new(&session)
            .find_target_children("S1", "DB1", &path)
            .await
            .unwrap_err();
        assert_eq!(err, DiscoveryError::DepthExceeded { segments: 11, max: 10 });
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn auth_rejection_is_not_reported_as_not_found() {
        let transport = fixture::tree().status(&format!("{BASE}/assetservers"), 401);
        let session = session(transport);
        let err = Navigator::new(&session)
            .find_target_children("S1", "DB1", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::AuthRequired { status: 401, .. }));
    }

    #[tokio::test]
    async fn listing_failure_is_a_transport_error() {
        let transport = fixture::tree().fail(
            &format!("{BASE}/elements/area/elements"),
            crate::client::mock::timed_out,
        );
        let session = session(transport);
        let err = Navigator::new(&session)
            .find_target_children("S1", "DB1", "Area/PadB")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Transport {
                error: TransportError::Timeout { .. }
            }
        ));
    }
}
