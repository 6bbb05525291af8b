//! Consumed interface to the expression-tree evaluator.
//!
//! The host evaluator owns a node-based AST addressable by id, with
//! children reachable through first-child/next-sibling traversal. This
//! engine only needs that traversal plus typed value extraction, so the
//! whole dependency is the [`ExprNodes`] trait.
//!
//! [`ExprArena`] is a minimal flat-array implementation of the trait used
//! by embedders that build argument lists programmatically, and by this
//! crate's tests.

/// Node id inside the host evaluator's node pool.
pub type NodeId = usize;

/// Traversal and value-extraction primitives over the host's node pool.
///
/// Implemented by the expression-tree evaluator (or a stand-in). The engine
/// never mutates nodes and never retains ids past one dispatch.
pub trait ExprNodes {
    /// First child of a node, if any.
    fn first_child(&self, node: NodeId) -> Option<NodeId>;

    /// Next sibling of a node, if any.
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Numeric payload of a leaf node.
    fn numeric_value(&self, node: NodeId) -> Option<f64>;

    /// Textual payload of a leaf node.
    fn text_value(&self, node: NodeId) -> Option<&str>;

    /// Game-object handle payload of a leaf node.
    fn handle_value(&self, node: NodeId) -> Option<u64>;

    /// Number of children, by walking the sibling chain.
    fn count_children(&self, node: NodeId) -> usize {
        let mut count = 0;
        let mut cursor = self.first_child(node);
        while let Some(id) = cursor {
            count += 1;
            cursor = self.next_sibling(id);
        }
        count
    }
}

/// Leaf payload of an arena node.
#[derive(Debug, Clone, PartialEq)]
enum NodeValue {
    /// Interior list node; carries no payload of its own.
    List,
    Number(f64),
    Text(String),
    Handle(u64),
}

#[derive(Debug, Clone)]
struct Node {
    value: NodeValue,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Flat node pool with first-child/next-sibling links.
#[derive(Debug, Clone, Default)]
pub struct ExprArena {
    nodes: Vec<Node>,
}

impl ExprArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn push(&mut self, value: NodeValue) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            value,
            first_child: None,
            next_sibling: None,
        });
        id
    }

    /// Allocate an interior list node.
    pub fn list(&mut self) -> NodeId {
        self.push(NodeValue::List)
    }

    /// Allocate a numeric leaf.
    pub fn number(&mut self, n: f64) -> NodeId {
        self.push(NodeValue::Number(n))
    }

    /// Allocate a text leaf.
    pub fn text(&mut self, s: impl Into<String>) -> NodeId {
        self.push(NodeValue::Text(s.into()))
    }

    /// Allocate an opaque handle leaf.
    pub fn handle(&mut self, id: u64) -> NodeId {
        self.push(NodeValue::Handle(id))
    }

    /// Append a child at the end of a parent's sibling chain.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        match self.nodes[parent].first_child {
            None => self.nodes[parent].first_child = Some(child),
            Some(first) => {
                let mut cursor = first;
                while let Some(next) = self.nodes[cursor].next_sibling {
                    cursor = next;
                }
                self.nodes[cursor].next_sibling = Some(child);
            }
        }
    }

    /// Allocate a list node with the given children, in order.
    pub fn list_with(&mut self, children: &[NodeId]) -> NodeId {
        let parent = self.list();
        for &child in children {
            self.append_child(parent, child);
        }
        parent
    }
}

impl ExprNodes for ExprArena {
    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.first_child)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.next_sibling)
    }

    fn numeric_value(&self, node: NodeId) -> Option<f64> {
        match self.nodes.get(node)?.value {
            NodeValue::Number(n) => Some(n),
            _ => None,
        }
    }

    fn text_value(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node)?.value {
            NodeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn handle_value(&self, node: NodeId) -> Option<u64> {
        match self.nodes.get(node)?.value {
            NodeValue::Handle(h) => Some(h),
            _ => None,
        }
    }
}
