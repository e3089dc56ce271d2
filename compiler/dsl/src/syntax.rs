//! The syntax tree that the parser hands over to the compiler stages.
//!
//! The tree is an arena: every node lives in one vector and refers to its
//! parent and children by [`NodeId`]. Node kinds are a closed enumeration so
//! that the stages can match on them exhaustively. Attributes are strings, as
//! produced by the parser; the type checker adds the `inferredType`
//! attribute to expression nodes.
//!
//! Trees are either assembled with [`NodeBuilder`] or decoded from JSON with
//! the same shape:
//!
//! ```json
//! { "kind": "ID", "attributes": { "name": "x" }, "line": 3, "column": 9 }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::SourcePosition;
use crate::types::Type;

/// Attribute that holds the type the type checker inferred for an
/// expression node.
pub const INFERRED_TYPE: &str = "inferredType";

/// Errors when exchanging a syntax tree with the parser.
#[derive(Debug, Error)]
pub enum SyntaxTreeError {
    #[error("Syntax tree is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Syntax tree has no root node")]
    Empty,
}

/// Index of a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The kind of a syntax tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Program,
    ImportDeclaration,
    ClassDeclaration,
    InheritanceDeclaration,
    VarDeclaration,
    Type,
    MainMethod,
    InstanceMethod,
    MethodHeader,
    MethodArguments,
    MethodBody,
    ReturnExpression,
    ExpressionStatement,
    ScopeStatement,
    IfStatement,
    IfCondition,
    ThenStatement,
    ElseStatement,
    WhileStatement,
    WhileCondition,
    WhileBody,
    #[serde(rename = "IDAssignment")]
    IdAssignment,
    ArrayAssignment,
    BinOp,
    UnaryOp,
    ArrayExpression,
    AccessExpression,
    CallExpression,
    MemberArgs,
    Length,
    ParenthesisExpression,
    Literal,
    This,
    NewArray,
    NewObject,
    #[serde(rename = "ID")]
    Id,
}

impl NodeKind {
    /// Returns true for kinds that can appear where a value is expected.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::BinOp
                | NodeKind::UnaryOp
                | NodeKind::ArrayExpression
                | NodeKind::AccessExpression
                | NodeKind::ParenthesisExpression
                | NodeKind::Literal
                | NodeKind::This
                | NodeKind::NewArray
                | NodeKind::NewObject
                | NodeKind::Id
        )
    }

    pub fn is_method(&self) -> bool {
        matches!(self, NodeKind::MainMethod | NodeKind::InstanceMethod)
    }
}

/// One node of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    attributes: BTreeMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    position: Option<SourcePosition>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Arena of syntax nodes with a single root.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a tree from the JSON form of [`NodeBuilder`].
    pub fn from_json(json: &str) -> Result<Self, SyntaxTreeError> {
        let builder: NodeBuilder = serde_json::from_str(json)?;
        Ok(builder.build())
    }

    /// Encodes the tree in the JSON form of [`NodeBuilder`].
    pub fn to_json(&self) -> Result<String, SyntaxTreeError> {
        let root = self.root.ok_or(SyntaxTreeError::Empty)?;
        Ok(serde_json::to_string_pretty(&self.to_builder(root))?)
    }

    /// Adds a node without a parent and makes it the root of the tree.
    pub fn add_root(&mut self, kind: NodeKind) -> NodeId {
        let id = self.push(kind, None);
        self.root = Some(id);
        id
    }

    /// Adds a node as the last child of the parent.
    pub fn add_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.push(kind, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            attributes: BTreeMap::new(),
            children: vec![],
            parent,
            position: None,
        });
        id
    }

    /// Sets an attribute as part of building the tree.
    pub fn set_attribute(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<String>) {
        self.nodes[id.0].attributes.insert(key.into(), value.into());
    }

    pub fn set_position(&mut self, id: NodeId, position: SourcePosition) {
        self.nodes[id.0].position = Some(position);
    }

    /// Attaches a derived attribute to a node. The first value written for
    /// an attribute is kept; returns false when the attribute already exists.
    pub fn annotate(&mut self, id: NodeId, key: &str, value: impl Into<String>) -> bool {
        let attributes = &mut self.nodes[id.0].attributes;
        if attributes.contains_key(key) {
            return false;
        }
        attributes.insert(key.to_string(), value.into());
        true
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.nodes[id.0].attribute(key)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.0].children.get(index).copied()
    }

    pub fn first_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of_kind(id, kind).next()
    }

    pub fn children_of_kind(
        &self,
        id: NodeId,
        kind: NodeKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.kind(*child) == kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Returns the closest strict ancestor of the given kind.
    pub fn ancestor(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.enclosing(id, &[kind])
    }

    /// Returns the closest strict ancestor whose kind is one of `kinds`.
    pub fn enclosing(&self, id: NodeId, kinds: &[NodeKind]) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if kinds.contains(&self.kind(node)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Position of the node, or of the closest ancestor that has one.
    pub fn position(&self, id: NodeId) -> SourcePosition {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(position) = self.nodes[node.0].position {
                return position;
            }
            current = self.parent(node);
        }
        SourcePosition::default()
    }

    /// The `name` of an `ID` node.
    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Id => self.attribute(id, "name"),
            _ => None,
        }
    }

    /// The `name` of the first `ID` child of the node.
    pub fn child_identifier(&self, id: NodeId) -> Option<&str> {
        self.first_child_of_kind(id, NodeKind::Id)
            .and_then(|child| self.identifier(child))
    }

    /// The type declared by a `Type` node.
    pub fn declared_type(&self, id: NodeId) -> Option<Type> {
        if self.kind(id) != NodeKind::Type {
            return None;
        }
        let ty = Type::from_token(self.attribute(id, "type")?);
        match self.attribute(id, "isArray") {
            Some("true") => Some(Type::new(ty.name(), true)),
            _ => Some(ty),
        }
    }

    fn to_builder(&self, id: NodeId) -> NodeBuilder {
        let node = &self.nodes[id.0];
        NodeBuilder {
            kind: node.kind,
            attributes: node.attributes.clone(),
            children: node
                .children
                .iter()
                .map(|child| self.to_builder(*child))
                .collect(),
            line: node.position.map(|p| p.line),
            column: node.position.map(|p| p.column),
        }
    }
}

/// Nested description of a node and its descendants. This is both the way
/// to assemble trees in code and the JSON exchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBuilder {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeBuilder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl NodeBuilder {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            children: vec![],
            line: None,
            column: None,
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn child(mut self, child: NodeBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Creates a tree whose root is this node.
    pub fn build(self) -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        let root = tree.add_root(self.kind);
        self.fill(&mut tree, root);
        tree
    }

    fn fill(self, tree: &mut SyntaxTree, id: NodeId) {
        for (key, value) in self.attributes {
            tree.set_attribute(id, key, value);
        }
        if let Some(line) = self.line {
            tree.set_position(id, SourcePosition::new(line, self.column.unwrap_or(0)));
        }
        for child in self.children {
            let child_id = tree.add_node(id, child.kind);
            child.fill(tree, child_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment() -> SyntaxTree {
        NodeBuilder::new(NodeKind::IdAssignment)
            .at(2, 5)
            .child(NodeBuilder::new(NodeKind::Id).attr("name", "x"))
            .child(
                NodeBuilder::new(NodeKind::Literal)
                    .attr("type", "int")
                    .attr("value", "1"),
            )
            .build()
    }

    #[test]
    fn build_when_nested_then_children_have_parent() {
        let tree = assignment();
        let root = tree.root().unwrap();
        let id = tree.child(root, 0).unwrap();

        assert_eq!(tree.kind(root), NodeKind::IdAssignment);
        assert_eq!(tree.parent(id), Some(root));
        assert_eq!(tree.identifier(id), Some("x"));
        assert_eq!(tree.child_identifier(root), Some("x"));
    }

    #[test]
    fn position_when_node_has_none_then_uses_ancestor() {
        let tree = assignment();
        let root = tree.root().unwrap();
        let literal = tree.child(root, 1).unwrap();
        assert_eq!(tree.position(literal), SourcePosition::new(2, 5));
    }

    #[test]
    fn annotate_when_already_set_then_keeps_first_value() {
        let mut tree = assignment();
        let literal = tree.child(tree.root().unwrap(), 1).unwrap();

        assert!(tree.annotate(literal, INFERRED_TYPE, "int"));
        assert!(!tree.annotate(literal, INFERRED_TYPE, "boolean"));
        assert_eq!(tree.attribute(literal, INFERRED_TYPE), Some("int"));
    }

    #[test]
    fn ancestor_when_kind_present_then_returns_closest() {
        let tree = NodeBuilder::new(NodeKind::MethodBody)
            .child(
                NodeBuilder::new(NodeKind::ScopeStatement)
                    .child(NodeBuilder::new(NodeKind::ScopeStatement).child(NodeBuilder::new(
                        NodeKind::ExpressionStatement,
                    ))),
            )
            .build();
        let outer = tree.child(tree.root().unwrap(), 0).unwrap();
        let inner = tree.child(outer, 0).unwrap();
        let statement = tree.child(inner, 0).unwrap();

        assert_eq!(tree.ancestor(statement, NodeKind::ScopeStatement), Some(inner));
        assert_eq!(
            tree.ancestor(statement, NodeKind::MethodBody),
            tree.root()
        );
        assert_eq!(tree.ancestor(statement, NodeKind::Program), None);
    }

    #[test]
    fn from_json_when_kind_names_then_decodes() {
        let json = r#"{
            "kind": "IDAssignment",
            "children": [
                { "kind": "ID", "attributes": { "name": "x" }, "line": 4, "column": 9 },
                { "kind": "Literal", "attributes": { "type": "boolean", "value": "true" } }
            ]
        }"#;
        let tree = SyntaxTree::from_json(json).unwrap();
        let root = tree.root().unwrap();
        let id = tree.child(root, 0).unwrap();

        assert_eq!(tree.kind(root), NodeKind::IdAssignment);
        assert_eq!(tree.position(id), SourcePosition::new(4, 9));
        assert_eq!(tree.attribute(tree.child(root, 1).unwrap(), "value"), Some("true"));
    }

    #[test]
    fn from_json_when_malformed_then_error() {
        let result = SyntaxTree::from_json(r#"{ "kind": "NotAKind" }"#);
        assert!(matches!(result, Err(SyntaxTreeError::Json(_))));
    }

    #[test]
    fn to_json_when_built_then_decodes_to_same_shape() {
        let tree = assignment();
        let json = tree.to_json().unwrap();
        let decoded = SyntaxTree::from_json(&json).unwrap();
        assert_eq!(decoded.len(), tree.len());
        assert_eq!(
            decoded.position(decoded.root().unwrap()),
            SourcePosition::new(2, 5)
        );
    }

    #[test]
    fn to_json_when_empty_then_error() {
        assert!(matches!(
            SyntaxTree::new().to_json(),
            Err(SyntaxTreeError::Empty)
        ));
    }
}
