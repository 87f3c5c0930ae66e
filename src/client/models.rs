//! Wire shapes of the asset API and the node model built from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Collection envelope: `{"Items": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Items<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Server, database, or element as listed by the API.
///
/// The API hands out both a `WebId` (the request handle) and an `Id`; the
/// former wins when both are present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireNode {
    pub name: String,
    #[serde(default)]
    pub web_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub has_children: Option<bool>,
    #[serde(default)]
    pub links: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireAttribute {
    pub name: String,
    #[serde(default)]
    pub web_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub links: BTreeMap<String, Value>,
}

/// Value container returned by an attribute's value link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeValue {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default = "default_good")]
    pub good: bool,
    #[serde(default)]
    pub questionable: bool,
    #[serde(default)]
    pub errors: Vec<Value>,
}

fn default_good() -> bool {
    true
}

fn string_links(links: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    links
        .into_iter()
        .filter_map(|(rel, href)| match href {
            Value::String(s) if !s.is_empty() => Some((rel, s)),
            _ => None,
        })
        .collect()
}

/// Level of a node; decides which relative endpoints are valid from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Server,
    Database,
    Element,
}

impl NodeKind {
    pub fn child_kind(self) -> NodeKind {
        match self {
            NodeKind::Server => NodeKind::Database,
            NodeKind::Database | NodeKind::Element => NodeKind::Element,
        }
    }

    fn children_rel(self) -> &'static str {
        match self {
            NodeKind::Server => "Databases",
            NodeKind::Database | NodeKind::Element => "Elements",
        }
    }

    fn children_path(self, id: &str) -> String {
        match self {
            NodeKind::Server => format!("assetservers/{id}/assetdatabases"),
            NodeKind::Database => format!("assetdatabases/{id}/elements"),
            NodeKind::Element => format!("elements/{id}/elements"),
        }
    }
}

/// Where to send a request: relative to the session base, or a link the API
/// handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Relative(String),
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub type_template: Option<String>,
    pub path: Option<String>,
    pub has_children: bool,
    #[serde(skip)]
    pub links: BTreeMap<String, String>,
}

impl AssetNode {
    /// Builds a node from its wire form; `None` when the API sent no handle.
    pub fn from_wire(wire: WireNode, kind: NodeKind) -> Option<Self> {
        let id = wire.web_id.or(wire.id).filter(|id| !id.is_empty())?;
        Some(Self {
            id,
            name: wire.name,
            kind,
            type_template: wire.template_name.filter(|t| !t.trim().is_empty()),
            path: wire.path,
            has_children: wire.has_children.unwrap_or(true),
            links: string_links(wire.links),
        })
    }

    pub fn children_endpoint(&self) -> Endpoint {
        match self.links.get(self.kind.children_rel()) {
            Some(link) => Endpoint::Link(link.clone()),
            None => Endpoint::Relative(self.kind.children_path(&self.id)),
        }
    }

    /// Attribute listing; only elements declare attributes.
    pub fn attributes_endpoint(&self) -> Option<Endpoint> {
        if self.kind != NodeKind::Element {
            return None;
        }
        Some(match self.links.get("Attributes") {
            Some(link) => Endpoint::Link(link.clone()),
            None => Endpoint::Relative(format!("elements/{}/attributes", self.id)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub id: String,
    pub value_link: Endpoint,
}

impl AttributeDescriptor {
    pub fn from_wire(wire: WireAttribute) -> Option<Self> {
        let id = wire.web_id.or(wire.id).filter(|id| !id.is_empty())?;
        let links = string_links(wire.links);
        let value_link = match links.get("Value") {
            Some(link) => Endpoint::Link(link.clone()),
            None => Endpoint::Relative(format!("streams/{id}/value")),
        };
        Some(Self {
            name: wire.name,
            id,
            value_link,
        })
    }
}
