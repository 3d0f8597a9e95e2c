//! Strictly-owned expression tree
//!
//! Every node sits in at most one input of one parent (its output
//! connection). Nodes without an output connection are roots. Variables are
//! owned by their node through named fields; values additionally occupy an
//! owner slot while registered.

mod builders;
mod kind;

pub use kind::{ArithOp, CompareOp, NodeKind};

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{BindingError, Result};
use crate::forest::Forest;
use crate::id::define_id;
use crate::variable::VarId;
use crate::workspace::WorkspaceId;

define_id!(
    /// Identifier of a tree node.
    NodeId,
    "node"
);

/// A parent input a node is plugged into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    /// The parent node
    pub node: NodeId,
    /// The parent's input name
    pub input: String,
}

/// A node of the expression tree.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    workspace: WorkspaceId,
    pub(crate) output: Option<Connection>,
    pub(crate) inputs: IndexMap<String, Option<NodeId>>,
    pub(crate) value_slots: IndexMap<String, VarId>,
    pub(crate) declared: IndexMap<String, VarId>,
    pub(crate) preview: bool,
}

impl Node {
    fn new(kind: NodeKind, workspace: WorkspaceId, preview: bool) -> Self {
        let inputs = kind.inputs().into_iter().map(|name| (name, None)).collect();
        Self {
            id: NodeId::fresh(),
            kind,
            workspace,
            output: None,
            inputs,
            value_slots: IndexMap::new(),
            declared: IndexMap::new(),
            preview,
        }
    }

    /// This node's identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// What kind of node this is.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The workspace the node lives on.
    pub fn workspace(&self) -> WorkspaceId {
        self.workspace
    }

    /// Where this node is plugged in, or `None` for a root.
    pub fn output_connection(&self) -> Option<&Connection> {
        self.output.as_ref()
    }

    /// Whether this node is a root.
    pub fn is_root(&self) -> bool {
        self.output.is_none()
    }

    /// Whether the node exposes an input called `name`.
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// The child connected to `name`, if any.
    pub fn input(&self, name: &str) -> Option<NodeId> {
        self.inputs.get(name).copied().flatten()
    }

    /// Connected children in input order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.inputs.values().filter_map(|child| *child)
    }

    /// The value registered in owner slot `field`.
    pub fn value_slot(&self, field: &str) -> Option<VarId> {
        self.value_slots.get(field).copied()
    }

    /// All occupied owner slots.
    pub fn value_slots(&self) -> impl Iterator<Item = (&str, VarId)> {
        self.value_slots.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Every variable this node created, keyed by field.
    pub fn declared_variables(&self) -> impl Iterator<Item = (&str, VarId)> {
        self.declared.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The variable created for `field`, whether registered or not.
    pub fn declared_variable(&self, field: &str) -> Option<VarId> {
        self.declared.get(field).copied()
    }

    /// Whether this node was marked as preview-only.
    pub fn is_preview(&self) -> bool {
        self.preview
    }
}

impl Forest {
    /// Create a detached node on `workspace`.
    pub fn create_node(&mut self, workspace: WorkspaceId, kind: NodeKind) -> Result<NodeId> {
        let preview = self.workspace(workspace)?.is_preview();
        let node = Node::new(kind, workspace, preview);
        let id = node.id();
        trace!(node = %id, kind = node.kind().name(), workspace = %workspace, "created node");
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Plug root `child` into `input` of `parent`.
    ///
    /// Existing binding edges inside `child` stay valid because the values
    /// they point at travel with it. Unbound references are left unbound;
    /// see [`Forest::resolve_subtree`].
    pub fn connect(&mut self, child: NodeId, parent: NodeId, input: &str) -> Result<()> {
        let refuse = |reason: &str| BindingError::InvalidConnection {
            child,
            parent,
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let child_node = self.node(child)?;
        let parent_node = self.node(parent)?;
        if child_node.workspace() != parent_node.workspace() {
            return Err(refuse("nodes live on different workspaces"));
        }
        if !parent_node.has_input(input) {
            return Err(refuse("no such input"));
        }
        if parent_node.input(input).is_some() {
            return Err(refuse("input already occupied"));
        }
        if !child_node.is_root() {
            return Err(refuse("child is already connected"));
        }
        if self.is_in_subtree(parent, child) {
            return Err(refuse("connection would create a cycle"));
        }

        self.node_mut(parent)?
            .inputs
            .insert(input.to_string(), Some(child));
        self.node_mut(child)?.output = Some(Connection {
            node: parent,
            input: input.to_string(),
        });
        trace!(child = %child, parent = %parent, input, "connected");
        Ok(())
    }

    /// Unplug `child` from its parent without touching binding edges.
    pub(crate) fn detach(&mut self, child: NodeId) -> Result<Option<Connection>> {
        let Some(conn) = self.node_mut(child)?.output.take() else {
            return Ok(None);
        };
        if let Some(slot) = self
            .nodes
            .get_mut(&conn.node)
            .and_then(|parent| parent.inputs.get_mut(&conn.input))
        {
            *slot = None;
        }
        trace!(child = %child, parent = %conn.node, input = %conn.input, "detached");
        Ok(Some(conn))
    }

    /// `node` and all of its descendants, in pre-order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        self.walk(node).collect()
    }

    /// Lazy pre-order walk over `node` and everything plugged beneath it.
    pub fn walk(&self, node: NodeId) -> Walk<'_> {
        Walk {
            forest: self,
            stack: vec![node],
        }
    }

    /// The topmost node of the expression containing `node`.
    pub fn root_of(&self, node: NodeId) -> Result<NodeId> {
        let mut current = self.node(node)?;
        while let Some(parent) = current
            .output_connection()
            .and_then(|conn| self.nodes.get(&conn.node))
        {
            current = parent;
        }
        Ok(current.id())
    }

    /// Whether `node` is `root` or nested inside it.
    pub fn is_in_subtree(&self, node: NodeId, root: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self
                .nodes
                .get(&id)
                .and_then(|n| n.output_connection())
                .map(|conn| conn.node);
        }
        false
    }

    /// Mark a node as preview-only (or not).
    pub fn set_preview(&mut self, node: NodeId, preview: bool) -> Result<()> {
        self.node_mut(node)?.preview = preview;
        Ok(())
    }

    /// Whether the tree containing `node` is a non-binding preview context.
    pub fn is_preview_tree(&self, node: NodeId) -> Result<bool> {
        let root = self.node(self.root_of(node)?)?;
        Ok(root.is_preview() || self.workspace(root.workspace())?.is_preview())
    }

    /// Root nodes living on `workspace`, in creation order.
    pub fn root_nodes(&self, workspace: WorkspaceId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.workspace() == workspace && n.is_root())
            .map(|n| n.id())
            .collect()
    }
}

/// Pre-order iterator returned by [`Forest::walk`].
///
/// Ids that no longer name a node are skipped.
pub struct Walk<'a> {
    forest: &'a Forest,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let forest = self.forest;
        while let Some(id) = self.stack.pop() {
            if let Some(node) = forest.nodes.get(&id) {
                self.stack.extend(node.children().rev());
                return Some(id);
            }
        }
        None
    }
}
