use hrsaas_model::DepartmentNode;
use std::borrow::Cow;

/// Prunes the forest to departments whose name contains `keyword`
/// (case-insensitive) or that have a matching descendant. Order is kept.
///
/// A matching node keeps its full subtree unless some of its children match
/// on their own, in which case only those children survive. An empty keyword
/// hands back the input untouched.
pub fn filter_tree<'a>(nodes: &'a [DepartmentNode], keyword: &str) -> Cow<'a, [DepartmentNode]> {
    if keyword.is_empty() {
        return Cow::Borrowed(nodes);
    }
    Cow::Owned(filter_nodes(nodes, &keyword.to_lowercase()))
}

fn filter_nodes(nodes: &[DepartmentNode], needle: &str) -> Vec<DepartmentNode> {
    nodes
        .iter()
        .filter_map(|node| {
            let children = filter_nodes(&node.children, needle);
            if !children.is_empty() {
                return Some(DepartmentNode {
                    children,
                    ..shallow(node)
                });
            }
            node.name
                .to_lowercase()
                .contains(needle)
                .then(|| node.clone())
        })
        .collect()
}

fn shallow(node: &DepartmentNode) -> DepartmentNode {
    DepartmentNode {
        id: node.id.clone(),
        name: node.name.clone(),
        code: node.code.clone(),
        children: Vec::new(),
    }
}

/// Depth-first lookup by id.
pub fn find_department<'a>(nodes: &'a [DepartmentNode], id: &str) -> Option<&'a DepartmentNode> {
    nodes.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find_department(&node.children, id)
        }
    })
}

pub fn count_nodes(nodes: &[DepartmentNode]) -> usize {
    nodes.iter().map(|n| 1 + count_nodes(&n.children)).sum()
}
