use crate::client::AssetNode;

/// Keeps the nodes built from `template`, compared case-insensitively.
///
/// No template (or a blank one) passes everything through; with a template,
/// nodes that declare none are dropped. Order is preserved.
pub fn filter_by_template(nodes: Vec<AssetNode>, template: Option<&str>) -> Vec<AssetNode> {
    let Some(template) = template.map(str::trim).filter(|t| !t.is_empty()) else {
        return nodes;
    };
    let wanted = template.to_lowercase();
    nodes
        .into_iter()
        .filter(|node| {
            node.type_template
                .as_deref()
                .is_some_and(|t| t.trim().to_lowercase() == wanted)
        })
        .collect()
}
