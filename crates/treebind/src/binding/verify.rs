//! Whole-forest invariant checking

use crate::error::{BindingError, Result};
use crate::forest::Forest;
use crate::variable::{Membership, Role, VarId};

impl Forest {
    /// Check every bookkeeping invariant.
    ///
    /// - membership state agrees with owner slots and databases
    /// - database and slot entries point at live variables of the right role
    /// - binding edges are symmetric and every bound value is visible from
    ///   its reference
    ///
    /// # Errors
    ///
    /// `InconsistentState` naming the first offending variable.
    pub fn verify(&self) -> Result<()> {
        for var in self.variables.values() {
            let id = var.id();
            let node = self.node(var.source_node())?;
            let in_slot = node.value_slot(var.field_name()) == Some(id);
            let holders: Vec<_> = self
                .workspaces
                .values()
                .filter(|ws| match var.role() {
                    Role::Value => ws.values.contains(id),
                    Role::Reference => ws.references.contains(id),
                })
                .map(|ws| ws.id())
                .collect();

            let expected_slot = var.is_value() && var.membership.in_owner_slot();
            if in_slot != expected_slot {
                return Err(fail(id, format!("{:?} but in slot = {}", var.membership, in_slot)));
            }
            let expected_db: Vec<_> = var.membership.workspace().into_iter().collect();
            if holders != expected_db {
                return Err(fail(id, format!("{:?} but held by {:?}", var.membership, holders)));
            }
            if var.is_reference() && var.membership == Membership::AttachedToSlot {
                return Err(fail(id, "reference attached to an owner slot"));
            }

            if let Some(value) = var.bound_value() {
                let decl = self.variable(value)?;
                if !decl.references().any(|r| r == id) {
                    return Err(fail(id, format!("{} does not list it as bound", value)));
                }
                if !self.get_visible_values(id)?.contains(&value) {
                    return Err(fail(id, format!("bound to {} which is out of scope", value)));
                }
            }
            for r in var.references() {
                if self.variable(r)?.bound_value() != Some(id) {
                    return Err(fail(id, format!("lists {} which is not bound to it", r)));
                }
            }
        }

        for node in self.nodes.values() {
            for (field, value) in node.value_slots() {
                let var = self.variable(value)?;
                if var.source_node() != node.id() || var.field_name() != field || !var.is_value() {
                    return Err(fail(value, format!("misplaced in slot `{}` of {}", field, node.id())));
                }
            }
        }
        Ok(())
    }
}

fn fail(id: VarId, reason: impl Into<String>) -> BindingError {
    BindingError::inconsistent(id, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BindingOptions;

    #[test]
    fn test_verify_detects_asymmetric_edge() {
        let mut forest = Forest::with_options(BindingOptions::new().verify(false));
        let ws = forest.create_workspace(None).unwrap();
        let lambda = forest.lambda(ws, "x").unwrap();
        let get = forest.var_get(ws, "x").unwrap();
        forest.connect(get, lambda, "RETURN").unwrap();
        let r = forest.reference_of(get).unwrap();
        let v = forest.value_of(lambda, "VAR").unwrap();
        forest.bind_reference(r, v).unwrap();
        forest.verify().unwrap();

        if let crate::variable::VariableKind::Value { references, .. } =
            &mut forest.variable_mut(v).unwrap().kind
        {
            references.clear();
        }
        assert!(matches!(
            forest.verify(),
            Err(BindingError::InconsistentState { .. })
        ));
    }

    #[test]
    fn test_verify_detects_out_of_scope_binding() {
        let mut forest = Forest::with_options(BindingOptions::new().verify(false));
        let ws = forest.create_workspace(None).unwrap();
        let lambda = forest.lambda(ws, "x").unwrap();
        let get = forest.var_get(ws, "x").unwrap();
        forest.connect(get, lambda, "RETURN").unwrap();
        let r = forest.reference_of(get).unwrap();
        let v = forest.value_of(lambda, "VAR").unwrap();
        forest.bind_reference(r, v).unwrap();

        forest.detach(get).unwrap();
        assert!(forest.verify().is_err());
    }
}
