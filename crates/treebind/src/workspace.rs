//! Editing surfaces and their variable databases

use indexmap::IndexMap;

use crate::id::define_id;
use crate::tree::NodeId;
use crate::variable::VarId;

define_id!(
    /// Identifier of an editing surface.
    WorkspaceId,
    "ws"
);

/// An identifier → owning node map holding one role of variables.
#[derive(Debug, Clone, Default)]
pub struct VariableDb {
    entries: IndexMap<VarId, NodeId>,
}

impl VariableDb {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: VarId) -> bool {
        self.entries.contains_key(&id)
    }

    /// The node owning `id`, if present.
    pub fn get(&self, id: VarId) -> Option<NodeId> {
        self.entries.get(&id).copied()
    }

    /// All ids, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = VarId> + '_ {
        self.entries.keys().copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the database is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, id: VarId, node: NodeId) {
        self.entries.insert(id, node);
    }

    pub(crate) fn remove(&mut self, id: VarId) -> Option<NodeId> {
        self.entries.shift_remove(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// An editing surface.
///
/// Workspaces form a family through their parent links; a main surface and
/// its flyout/example surfaces share one naming domain.
#[derive(Debug, Clone)]
pub struct Workspace {
    id: WorkspaceId,
    parent: Option<WorkspaceId>,
    pub(crate) children: Vec<WorkspaceId>,
    preview: bool,
    pub(crate) values: VariableDb,
    pub(crate) references: VariableDb,
}

impl Workspace {
    pub(crate) fn new(parent: Option<WorkspaceId>, preview: bool) -> Self {
        Self {
            id: WorkspaceId::fresh(),
            parent,
            children: Vec::new(),
            preview,
            values: VariableDb::new(),
            references: VariableDb::new(),
        }
    }

    /// This workspace's identifier.
    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    /// The parent surface, if this is a child surface.
    pub fn parent(&self) -> Option<WorkspaceId> {
        self.parent
    }

    /// Child surfaces.
    pub fn children(&self) -> &[WorkspaceId] {
        &self.children
    }

    /// Whether trees on this surface are preview-only (flyouts, templates).
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// The value database.
    pub fn value_db(&self) -> &VariableDb {
        &self.values
    }

    /// The reference database.
    pub fn reference_db(&self) -> &VariableDb {
        &self.references
    }
}
