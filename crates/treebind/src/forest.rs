//! The arena owning workspaces, nodes and variables

use indexmap::IndexMap;
use tracing::debug;

use crate::context::BindingOptions;
use crate::error::{BindingError, Result};
use crate::tree::{Node, NodeId};
use crate::variable::{Membership, Role, TypeExpr, VarId, Variable, VariableKind};
use crate::workspace::{Workspace, WorkspaceId};

/// Owner of every workspace, node and variable in an editing session.
///
/// Nodes own their children through named inputs; binding edges between
/// references and values are plain ids layered on top of that tree and are
/// re-validated against the current tree shape whenever they are used.
///
/// # Example
///
/// ```
/// use treebind::Forest;
///
/// let mut forest = Forest::new();
/// let ws = forest.create_workspace(None).unwrap();
///
/// let lambda = forest.lambda(ws, "x").unwrap();
/// let body = forest.var_get(ws, "x").unwrap();
/// forest.connect(body, lambda, "RETURN").unwrap();
///
/// let reference = forest.reference_of(body).unwrap();
/// let value = forest.resolve_reference(reference).unwrap();
/// assert_eq!(value, forest.value_of(lambda, "VAR"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub(crate) options: BindingOptions,
    pub(crate) workspaces: IndexMap<WorkspaceId, Workspace>,
    pub(crate) nodes: IndexMap<NodeId, Node>,
    pub(crate) variables: IndexMap<VarId, Variable>,
}

impl Forest {
    /// Create an empty forest with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty forest with the given options.
    pub fn with_options(options: BindingOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// The active configuration.
    pub fn options(&self) -> &BindingOptions {
        &self.options
    }

    // ═══════════════════════════════════════════════════════════════════
    // Workspaces
    // ═══════════════════════════════════════════════════════════════════

    /// Create an editing surface, optionally as a child of `parent`.
    pub fn create_workspace(&mut self, parent: Option<WorkspaceId>) -> Result<WorkspaceId> {
        self.insert_workspace(parent, false)
    }

    /// Create a preview-only surface (flyout or template) under `parent`.
    pub fn create_preview_workspace(&mut self, parent: WorkspaceId) -> Result<WorkspaceId> {
        self.insert_workspace(Some(parent), true)
    }

    fn insert_workspace(&mut self, parent: Option<WorkspaceId>, preview: bool) -> Result<WorkspaceId> {
        if let Some(parent) = parent {
            self.workspace(parent)?;
        }
        let ws = Workspace::new(parent, preview);
        let id = ws.id();
        self.workspaces.insert(id, ws);
        if let Some(parent) = parent.and_then(|p| self.workspaces.get_mut(&p)) {
            parent.children.push(id);
        }
        debug!(workspace = %id, ?parent, preview, "created workspace");
        Ok(id)
    }

    /// Look up a workspace.
    pub fn workspace(&self, id: WorkspaceId) -> Result<&Workspace> {
        self.workspaces
            .get(&id)
            .ok_or(BindingError::UnknownWorkspace(id))
    }

    pub(crate) fn workspace_mut(&mut self, id: WorkspaceId) -> Result<&mut Workspace> {
        self.workspaces
            .get_mut(&id)
            .ok_or(BindingError::UnknownWorkspace(id))
    }

    /// The family of `id`: the topmost ancestor surface and all of its
    /// descendants, topmost first.
    pub fn workspace_family(&self, id: WorkspaceId) -> Result<Vec<WorkspaceId>> {
        let mut top = self.workspace(id)?;
        while let Some(parent) = top.parent().and_then(|p| self.workspaces.get(&p)) {
            top = parent;
        }

        let mut family = vec![top.id()];
        let mut i = 0;
        while i < family.len() {
            if let Some(ws) = self.workspaces.get(&family[i]) {
                family.extend(ws.children().iter().copied());
            }
            i += 1;
        }
        Ok(family)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Nodes and variables
    // ═══════════════════════════════════════════════════════════════════

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(BindingError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(BindingError::UnknownNode(id))
    }

    /// Look up a variable.
    pub fn variable(&self, id: VarId) -> Result<&Variable> {
        self.variables
            .get(&id)
            .ok_or(BindingError::UnknownVariable(id))
    }

    pub(crate) fn variable_mut(&mut self, id: VarId) -> Result<&mut Variable> {
        self.variables
            .get_mut(&id)
            .ok_or(BindingError::UnknownVariable(id))
    }

    /// Iterate over all live nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate over all live variables.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// The role of a variable.
    pub fn role(&self, id: VarId) -> Result<Role> {
        Ok(self.variable(id)?.role())
    }

    /// The display name of a variable. A bound reference shows its value's
    /// name.
    pub fn variable_name(&self, id: VarId) -> Result<&str> {
        let target = self.name_target(id)?;
        Ok(&self.variable(target)?.name)
    }

    /// The variable whose stored name is the display name of `id`.
    pub(crate) fn name_target(&self, id: VarId) -> Result<VarId> {
        let var = self.variable(id)?;
        Ok(match var.bound_value() {
            Some(value) if self.variables.contains_key(&value) => value,
            _ => id,
        })
    }

    /// Create a value owned by `node`, unattached to any slot or database.
    pub fn create_value(
        &mut self,
        node: NodeId,
        field_name: &str,
        type_expr: TypeExpr,
        scope_input: &str,
        name: &str,
    ) -> Result<VarId> {
        let var = Variable::new_value(node, field_name, type_expr, scope_input, name);
        self.adopt(node, var)
    }

    /// Create a reference owned by `node`, unattached to any database.
    pub fn create_reference(
        &mut self,
        node: NodeId,
        field_name: &str,
        type_expr: TypeExpr,
        name: &str,
    ) -> Result<VarId> {
        let var = Variable::new_reference(node, field_name, type_expr, name);
        self.adopt(node, var)
    }

    fn adopt(&mut self, node: NodeId, var: Variable) -> Result<VarId> {
        let id = var.id();
        let owner = self.node_mut(node)?;
        if owner.declared.contains_key(var.field_name()) {
            return Err(BindingError::duplicate(
                id,
                format!("{} already declares field `{}`", node, var.field_name()),
            ));
        }
        owner.declared.insert(var.field_name().to_string(), id);
        debug!(var = %id, node = %node, role = ?var.role(), name = %var.name, "created variable");
        self.variables.insert(id, var);
        Ok(id)
    }

    /// Drop a variable from the arena. It must be fully unregistered.
    pub(crate) fn destroy_variable(&mut self, id: VarId) -> Result<()> {
        let var = self.variable(id)?;
        if var.membership != Membership::Unattached {
            return Err(BindingError::inconsistent(
                id,
                format!("destroyed while {:?}", var.membership),
            ));
        }
        if let VariableKind::Value { references, .. } = &var.kind {
            if !references.is_empty() {
                return Err(BindingError::inconsistent(
                    id,
                    format!("destroyed with {} bound references", references.len()),
                ));
            }
        }
        if var.bound_value().is_some() {
            return Err(BindingError::inconsistent(id, "destroyed while bound"));
        }
        let node = var.source_node();
        if let Some(owner) = self.nodes.get_mut(&node) {
            owner.declared.retain(|_, v| *v != id);
        }
        self.variables.shift_remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    #[test]
    fn test_workspace_family() {
        let mut forest = Forest::new();
        let main = forest.create_workspace(None).unwrap();
        let child = forest.create_workspace(Some(main)).unwrap();
        let flyout = forest.create_preview_workspace(child).unwrap();
        let other = forest.create_workspace(None).unwrap();

        assert_eq!(forest.workspace_family(flyout).unwrap(), vec![main, child, flyout]);
        assert_eq!(forest.workspace_family(main).unwrap(), vec![main, child, flyout]);
        assert_eq!(forest.workspace_family(other).unwrap(), vec![other]);
        assert!(forest.workspace(flyout).unwrap().is_preview());
    }

    #[test]
    fn test_unknown_ids() {
        let forest = Forest::new();
        assert_eq!(
            forest.workspace(WorkspaceId::from_raw(u64::MAX)).unwrap_err(),
            BindingError::UnknownWorkspace(WorkspaceId::from_raw(u64::MAX))
        );
        assert!(forest.node(NodeId::from_raw(u64::MAX)).is_err());
        assert!(forest.variable(VarId::from_raw(u64::MAX)).is_err());
    }

    #[test]
    fn test_duplicate_field_declaration() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let node = forest.create_node(ws, NodeKind::Lambda).unwrap();
        forest
            .create_value(node, "VAR", TypeExpr::default(), "RETURN", "x")
            .unwrap();
        let err = forest
            .create_value(node, "VAR", TypeExpr::default(), "RETURN", "y")
            .unwrap_err();
        assert!(matches!(err, BindingError::DuplicateBinding { .. }));
    }

    #[test]
    fn test_destroy_requires_unregistration() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let node = forest.create_node(ws, NodeKind::Lambda).unwrap();
        let value = forest
            .create_value(node, "VAR", TypeExpr::default(), "RETURN", "x")
            .unwrap();
        forest.add_value(ws, value).unwrap();

        assert!(forest.destroy_variable(value).is_err());
        forest.remove_value(ws, value).unwrap();
        forest.destroy_variable(value).unwrap();
        assert!(forest.variable(value).is_err());
    }
}
