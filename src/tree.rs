use serde::{Deserialize, Serialize};

/// Inspection tree emitted by `Document::to_tree`. Mirrors the document
/// structure one node per Block, Word and Character; a Character's children
/// are the names of its active formatting properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub children: Vec<TreeChild>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TreeChild {
    Node(TreeNode),
    Prop(String),
}

impl TreeNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: None,
            children: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_children(mut self, children: Vec<TreeChild>) -> Self {
        self.children = children;
        self
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.children.iter().filter_map(|child| match child {
            TreeChild::Node(node) => Some(node),
            TreeChild::Prop(_) => None,
        })
    }

    pub fn props(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|child| match child {
            TreeChild::Prop(name) => Some(name.as_str()),
            TreeChild::Node(_) => None,
        })
    }
}

impl From<TreeNode> for TreeChild {
    fn from(node: TreeNode) -> Self {
        TreeChild::Node(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_kind_serializes_as_type() {
        let node = TreeNode::new("b0", "B").with_kind("h1");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "h1");
        assert_eq!(json["name"], "B");
    }

    #[test]
    fn missing_kind_is_omitted() {
        let node = TreeNode::new("w0-0", "w");
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"id":"w0-0","name":"w","children":[]}"#);
    }

    #[test]
    fn children_mix_nodes_and_props() {
        let leaf = TreeNode::new("c0-0-0", "a")
            .with_children(vec![TreeChild::Prop("b".to_string())]);
        let word = TreeNode::new("w0-0", "w").with_children(vec![leaf.into()]);
        let json = serde_json::to_string(&word).unwrap();
        let parsed: TreeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, word);
        let first = parsed.nodes().next().unwrap();
        assert_eq!(first.props().collect::<Vec<_>>(), vec!["b"]);
    }
}
