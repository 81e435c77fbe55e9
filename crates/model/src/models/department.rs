use serde::{Deserialize, Serialize};

/// One node of the organization chart. The tree is acyclic and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub children: Vec<DepartmentNode>,
}

impl DepartmentNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<DepartmentNode>) -> Self {
        self.children = children;
        self
    }
}
