//! Registration of variables into owner slots and workspace databases

use tracing::{debug, trace};

use crate::error::{BindingError, Result};
use crate::forest::Forest;
use crate::tree::NodeId;
use crate::variable::{Membership, Role, VarId, Variable};
use crate::workspace::WorkspaceId;

impl Forest {
    // ═══════════════════════════════════════════════════════════════════
    // Values
    // ═══════════════════════════════════════════════════════════════════

    /// Install `value` in its owner slot and in the value database of `ws`.
    ///
    /// # Errors
    ///
    /// - `DuplicateBinding` if the value is already registered, its owner
    ///   slot is taken, or the database already holds its id
    /// - `UnsupportedOperation` if `value` is a reference
    pub fn add_value(&mut self, ws: WorkspaceId, value: VarId) -> Result<()> {
        let var = self.expect_role(value, Role::Value, "add_value")?;
        let node = var.source_node();
        let field = var.field_name().to_string();

        if var.membership != Membership::Unattached {
            return Err(BindingError::duplicate(
                value,
                format!("already registered ({:?})", var.membership),
            ));
        }
        let owner = self.node(node)?;
        if let Some(existing) = owner.value_slot(&field) {
            return Err(BindingError::duplicate(
                value,
                format!("owner slot `{}` of {} already holds {}", field, node, existing),
            ));
        }
        self.check_home_workspace(value, node, ws)?;
        if self.workspace(ws)?.values.contains(value) {
            return Err(BindingError::duplicate(
                value,
                format!("already in the value database of {}", ws),
            ));
        }

        let var = self.variable_mut(value)?;
        var.membership.attach_to_slot(value)?;
        var.membership.register(value, ws, true)?;
        self.node_mut(node)?.value_slots.insert(field, value);
        self.workspace_mut(ws)?.values.insert(value, node);
        debug!(var = %value, node = %node, workspace = %ws, "added value");
        self.check_after_mutation()
    }

    /// Remove `value` from its owner slot and from the value database of
    /// `ws`. References still bound to it are unbound first.
    ///
    /// # Errors
    ///
    /// `InconsistentState` if the value's state, slot and database entry do
    /// not all agree that it is registered in `ws`.
    pub fn remove_value(&mut self, ws: WorkspaceId, value: VarId) -> Result<()> {
        let var = self.expect_role(value, Role::Value, "remove_value")?;
        let node = var.source_node();
        let field = var.field_name().to_string();
        let membership = var.membership;

        let in_slot = self.node(node)?.value_slot(&field) == Some(value);
        let in_db = self.workspace(ws)?.values.contains(value);
        if membership != Membership::Registered(ws) || !in_slot || !in_db {
            return Err(BindingError::inconsistent(
                value,
                format!(
                    "cannot remove from {}: state {:?}, in slot {}, in database {}",
                    ws, membership, in_slot, in_db
                ),
            ));
        }

        self.unlink_value(value)?;
        let var = self.variable_mut(value)?;
        var.membership.unregister(value, ws, true)?;
        var.membership.detach_from_slot(value)?;
        self.node_mut(node)?.value_slots.shift_remove(&field);
        self.workspace_mut(ws)?.values.remove(value);
        debug!(var = %value, node = %node, workspace = %ws, "removed value");
        self.check_after_mutation()
    }

    /// Find a value in the database of `ws`.
    pub fn get_value_by_id(&self, ws: WorkspaceId, id: VarId) -> Result<Option<&Variable>> {
        let db = &self.workspace(ws)?.values;
        Ok(db.contains(id).then(|| self.variables.get(&id)).flatten())
    }

    // ═══════════════════════════════════════════════════════════════════
    // References
    // ═══════════════════════════════════════════════════════════════════

    /// Register `reference` in the reference database of `ws`.
    pub fn add_reference(&mut self, ws: WorkspaceId, reference: VarId) -> Result<()> {
        let var = self.expect_role(reference, Role::Reference, "add_reference")?;
        let node = var.source_node();

        if var.membership != Membership::Unattached {
            return Err(BindingError::duplicate(
                reference,
                format!("already registered ({:?})", var.membership),
            ));
        }
        self.check_home_workspace(reference, node, ws)?;
        if self.workspace(ws)?.references.contains(reference) {
            return Err(BindingError::duplicate(
                reference,
                format!("already in the reference database of {}", ws),
            ));
        }

        self.variable_mut(reference)?
            .membership
            .register(reference, ws, false)?;
        self.workspace_mut(ws)?.references.insert(reference, node);
        debug!(var = %reference, node = %node, workspace = %ws, "added reference");
        self.check_after_mutation()
    }

    /// Remove `reference` from the reference database of `ws`.
    pub fn remove_reference(&mut self, ws: WorkspaceId, reference: VarId) -> Result<()> {
        let var = self.expect_role(reference, Role::Reference, "remove_reference")?;
        let membership = var.membership;
        let in_db = self.workspace(ws)?.references.contains(reference);
        if membership != Membership::Registered(ws) || !in_db {
            return Err(BindingError::inconsistent(
                reference,
                format!(
                    "cannot remove from {}: state {:?}, in database {}",
                    ws, membership, in_db
                ),
            ));
        }

        self.variable_mut(reference)?
            .membership
            .unregister(reference, ws, false)?;
        self.workspace_mut(ws)?.references.remove(reference);
        debug!(var = %reference, workspace = %ws, "removed reference");
        self.check_after_mutation()
    }

    /// Find a reference in the database of `ws`.
    pub fn get_reference_by_id(&self, ws: WorkspaceId, id: VarId) -> Result<Option<&Variable>> {
        let db = &self.workspace(ws)?.references;
        Ok(db.contains(id).then(|| self.variables.get(&id)).flatten())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bulk operations
    // ═══════════════════════════════════════════════════════════════════

    /// Empty both databases of `ws`.
    ///
    /// Values stay in their owner slots. Every entry is checked before
    /// anything is cleared, so a failure leaves the workspace untouched.
    ///
    /// # Errors
    ///
    /// `InconsistentState` if any entry is not registered in `ws`.
    pub fn clear_workspace_db(&mut self, ws: WorkspaceId) -> Result<()> {
        let workspace = self.workspace(ws)?;
        let entries: Vec<(VarId, bool)> = workspace
            .references
            .ids()
            .map(|id| (id, false))
            .chain(workspace.values.ids().map(|id| (id, true)))
            .collect();

        for &(id, _) in &entries {
            let membership = self.variable(id)?.membership;
            if membership != Membership::Registered(ws) {
                return Err(BindingError::inconsistent(
                    id,
                    format!("database of {} holds entry in state {:?}", ws, membership),
                ));
            }
        }

        for &(id, slotted) in &entries {
            self.variable_mut(id)?.membership.unregister(id, ws, slotted)?;
        }
        let workspace = self.workspace_mut(ws)?;
        workspace.references.clear();
        workspace.values.clear();
        debug!(workspace = %ws, entries = entries.len(), "cleared variable databases");
        self.check_after_mutation()
    }

    /// Register every variable `node` created with the node's workspace.
    pub fn register_node_variables(&mut self, node: NodeId) -> Result<()> {
        let owner = self.node(node)?;
        let ws = owner.workspace();
        let declared: Vec<VarId> = owner.declared_variables().map(|(_, id)| id).collect();
        for id in declared {
            match self.role(id)? {
                Role::Value => self.add_value(ws, id)?,
                Role::Reference => self.add_reference(ws, id)?,
            }
        }
        Ok(())
    }

    /// Take every variable of `node` out of its slot and database, whatever
    /// its current state.
    pub fn unregister_node_variables(&mut self, node: NodeId) -> Result<()> {
        let declared: Vec<VarId> = self
            .node(node)?
            .declared_variables()
            .map(|(_, id)| id)
            .collect();
        for id in declared {
            self.release(id)?;
        }
        Ok(())
    }

    fn release(&mut self, id: VarId) -> Result<()> {
        let var = self.variable(id)?;
        match (var.membership, var.role()) {
            (Membership::Registered(ws), Role::Value) => self.remove_value(ws, id),
            (Membership::Registered(ws), Role::Reference) => self.remove_reference(ws, id),
            (Membership::AttachedToSlot, _) => {
                let node = var.source_node();
                let field = var.field_name().to_string();
                self.unlink_value(id)?;
                self.variable_mut(id)?.membership.detach_from_slot(id)?;
                if let Some(owner) = self.nodes.get_mut(&node) {
                    owner.value_slots.shift_remove(&field);
                }
                trace!(var = %id, "released owner slot");
                Ok(())
            }
            (Membership::Unattached, _) => Ok(()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn expect_role(
        &self,
        id: VarId,
        role: Role,
        operation: &'static str,
    ) -> Result<&Variable> {
        let var = self.variable(id)?;
        if var.role() != role {
            return Err(BindingError::unsupported(
                operation,
                format!("{} is a {:?}, expected a {:?}", id, var.role(), role),
            ));
        }
        Ok(var)
    }

    fn check_home_workspace(&self, id: VarId, node: NodeId, ws: WorkspaceId) -> Result<()> {
        let home = self.node(node)?.workspace();
        if home != ws {
            return Err(BindingError::inconsistent(
                id,
                format!("{} lives on {}, not {}", node, home, ws),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_after_mutation(&self) -> Result<()> {
        if self.options().verify_invariants {
            self.verify()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;
    use crate::variable::TypeExpr;

    fn lambda_with_value() -> (Forest, WorkspaceId, NodeId, VarId) {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let node = forest.create_node(ws, NodeKind::Lambda).unwrap();
        let value = forest
            .create_value(node, "VAR", TypeExpr::default(), "RETURN", "x")
            .unwrap();
        (forest, ws, node, value)
    }

    #[test]
    fn test_add_then_remove_value() {
        let (mut forest, ws, node, value) = lambda_with_value();

        forest.add_value(ws, value).unwrap();
        assert_eq!(forest.node(node).unwrap().value_slot("VAR"), Some(value));
        assert!(forest.get_value_by_id(ws, value).unwrap().is_some());
        assert_eq!(
            forest.variable(value).unwrap().membership(),
            Membership::Registered(ws)
        );

        forest.remove_value(ws, value).unwrap();
        assert_eq!(forest.node(node).unwrap().value_slot("VAR"), None);
        assert!(forest.get_value_by_id(ws, value).unwrap().is_none());
        assert_eq!(
            forest.variable(value).unwrap().membership(),
            Membership::Unattached
        );
    }

    #[test]
    fn test_clear_rejects_entry_in_wrong_state() {
        let (mut forest, ws, _, value) = lambda_with_value();
        forest.add_value(ws, value).unwrap();
        let get = forest.var_get(ws, "x").unwrap();
        let reference = forest.reference_of(get).unwrap();

        forest.variable_mut(value).unwrap().membership = Membership::AttachedToSlot;
        assert!(matches!(
            forest.clear_workspace_db(ws),
            Err(BindingError::InconsistentState { .. })
        ));

        // nothing was unregistered before the bad entry was found
        let workspace = forest.workspace(ws).unwrap();
        assert_eq!(workspace.value_db().len(), 1);
        assert_eq!(workspace.reference_db().len(), 1);
        assert_eq!(
            forest.variable(reference).unwrap().membership(),
            Membership::Registered(ws)
        );
    }

    #[test]
    fn test_add_value_twice() {
        let (mut forest, ws, _, value) = lambda_with_value();
        forest.add_value(ws, value).unwrap();
        assert!(matches!(
            forest.add_value(ws, value),
            Err(BindingError::DuplicateBinding { .. })
        ));
    }

    #[test]
    fn test_remove_value_twice() {
        let (mut forest, ws, _, value) = lambda_with_value();
        forest.add_value(ws, value).unwrap();
        forest.remove_value(ws, value).unwrap();
        assert!(matches!(
            forest.remove_value(ws, value),
            Err(BindingError::InconsistentState { .. })
        ));
    }

    #[test]
    fn test_wrong_role() {
        let (mut forest, ws, _, value) = lambda_with_value();
        assert!(matches!(
            forest.add_reference(ws, value),
            Err(BindingError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_add_value_on_foreign_workspace() {
        let (mut forest, _, _, value) = lambda_with_value();
        let other = forest.create_workspace(None).unwrap();
        assert!(forest.add_value(other, value).is_err());
        assert_eq!(
            forest.variable(value).unwrap().membership(),
            Membership::Unattached
        );
    }
}
