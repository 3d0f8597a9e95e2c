//! Visibility, lookup and binding edges

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::error::{BindingError, Result};
use crate::forest::Forest;
use crate::tree::NodeId;
use crate::variable::{Role, VarId, VariableFilter, VariableKind};
use crate::workspace::WorkspaceId;

/// Name → value environment visible at a connection point.
pub type Env = IndexMap<String, VarId>;

impl Forest {
    // ═══════════════════════════════════════════════════════════════════
    // Visibility
    // ═══════════════════════════════════════════════════════════════════

    /// The values visible to a child plugged into `input` of `node`.
    ///
    /// The environment is accumulated from the root downwards: every node on
    /// the path contributes the values whose scope input is the one the path
    /// continues through, and inner names shadow outer ones. Values named
    /// with the wildcard bind nothing.
    pub fn visible_variables_at(&self, node: NodeId, input: &str) -> Result<Env> {
        self.node(node)?;

        let mut path = vec![(node, input.to_string())];
        let mut current = node;
        while let Some(conn) = self.nodes.get(&current).and_then(|n| n.output_connection()) {
            path.push((conn.node, conn.input.clone()));
            current = conn.node;
        }

        let mut env = Env::new();
        for (id, input) in path.iter().rev() {
            let Some(scope) = self.nodes.get(id) else {
                continue;
            };
            for (_, value) in scope.value_slots() {
                let Some(var) = self.variables.get(&value) else {
                    continue;
                };
                if var.scope_input() == Some(input.as_str()) && !self.options().is_wildcard(&var.name) {
                    env.shift_remove(&var.name);
                    env.insert(var.name.clone(), value);
                }
            }
        }
        Ok(env)
    }

    /// The environment a reference resolves against. Empty for a reference
    /// whose node is a root.
    fn reference_env(&self, reference: VarId, operation: &'static str) -> Result<Env> {
        let var = self.expect_role(reference, Role::Reference, operation)?;
        match self.node(var.source_node())?.output_connection() {
            Some(conn) => self.visible_variables_at(conn.node, &conn.input),
            None => Ok(Env::new()),
        }
    }

    /// Values `reference` could legally bind to.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if `reference` is a value.
    pub fn get_visible_values(&self, reference: VarId) -> Result<Vec<VarId>> {
        let env = self.reference_env(reference, "get_visible_values")?;
        Ok(env.into_values().collect())
    }

    /// Whether no value anywhere in the family of `ws` is named `name`.
    pub fn is_unique_name(&self, name: &str, ws: WorkspaceId) -> Result<bool> {
        for member in self.workspace_family(ws)? {
            let db = &self.workspace(member)?.values;
            let taken = db
                .ids()
                .filter_map(|id| self.variables.get(&id))
                .any(|v| v.name == name);
            if taken {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether a value sitting in an owner slot anywhere in the family of
    /// `ws` is named `name`. Slotted values take part in scope resolution
    /// even after their database has been cleared.
    pub(crate) fn is_slotted_name(&self, name: &str, ws: WorkspaceId) -> Result<bool> {
        let family = self.workspace_family(ws)?;
        Ok(self
            .nodes
            .values()
            .filter(|n| family.contains(&n.workspace()))
            .flat_map(|n| n.value_slots())
            .filter_map(|(_, id)| self.variables.get(&id))
            .any(|v| v.name == name))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Collection
    // ═══════════════════════════════════════════════════════════════════

    /// `var` together with everything bound to the same declaration: the
    /// value first, then its references. An unbound reference yields only
    /// itself.
    pub fn get_all_bound_variables(&self, var: VarId) -> Result<Vec<VarId>> {
        let target = self.name_target(var)?;
        let decl = self.variable(target)?;
        let mut out = vec![target];
        out.extend(decl.references());
        Ok(out)
    }

    /// Roots of the trees containing `vars`, without duplicates.
    ///
    /// With `include_transitive`, each variable is first expanded to
    /// everything bound with it.
    pub fn get_all_root_blocks(&self, vars: &[VarId], include_transitive: bool) -> Result<Vec<NodeId>> {
        let mut targets = Vec::new();
        for &var in vars {
            if include_transitive {
                targets.extend(self.get_all_bound_variables(var)?);
            } else {
                targets.push(var);
            }
        }

        let mut roots = IndexSet::new();
        for var in targets {
            roots.insert(self.root_of(self.variable(var)?.source_node())?);
        }
        Ok(roots.into_iter().collect())
    }

    /// Values the given references are bound to, without duplicates.
    pub fn get_bound_values(&self, references: &[VarId]) -> Result<Vec<VarId>> {
        let mut values = IndexSet::new();
        for &r in references {
            if let Some(v) = self.variable(r)?.bound_value() {
                values.insert(v);
            }
        }
        Ok(values.into_iter().collect())
    }

    /// Variables owned by `node` or any descendant, filtered by role. The
    /// tree is walked lazily, in pre-order.
    pub fn get_all_variables_in_subtree(
        &self,
        node: NodeId,
        filter: VariableFilter,
    ) -> impl Iterator<Item = VarId> + '_ {
        self.walk(node)
            .flat_map(move |id| {
                self.nodes
                    .get(&id)
                    .into_iter()
                    .flat_map(|n| n.declared_variables().map(|(_, var)| var))
            })
            .filter(move |var| {
                self.variables
                    .get(var)
                    .is_some_and(|v| filter.accepts(v.role()))
            })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Binding edges
    // ═══════════════════════════════════════════════════════════════════

    /// Bind `reference` to `value`, replacing any previous binding.
    ///
    /// # Errors
    ///
    /// `OutOfScope` if `value` is not visible from `reference`.
    pub fn bind_reference(&mut self, reference: VarId, value: VarId) -> Result<()> {
        self.expect_role(value, Role::Value, "bind_reference")?;
        if !self.get_visible_values(reference)?.contains(&value) {
            return Err(BindingError::OutOfScope { reference, value });
        }
        self.link(reference, value)?;
        self.check_after_mutation()
    }

    /// Drop the binding of `reference`, returning the value it was bound to.
    pub fn unbind_reference(&mut self, reference: VarId) -> Result<Option<VarId>> {
        self.expect_role(reference, Role::Reference, "unbind_reference")?;
        let previous = self.unlink(reference)?;
        self.check_after_mutation()?;
        Ok(previous)
    }

    /// Bind `reference` to whatever value its name resolves to at its
    /// position. A reference whose name resolves to nothing is unbound.
    pub fn resolve_reference(&mut self, reference: VarId) -> Result<Option<VarId>> {
        let env = self.reference_env(reference, "resolve_reference")?;
        let name = self.variable_name(reference)?;
        let found = env.get(name).copied();
        match found {
            Some(value) => {
                if self.variable(reference)?.bound_value() != Some(value) {
                    self.link(reference, value)?;
                }
            }
            None => {
                self.unlink(reference)?;
            }
        }
        self.check_after_mutation()?;
        Ok(found)
    }

    /// Resolve every unbound reference under `node`; returns the ones that
    /// remain unbound.
    pub fn resolve_subtree(&mut self, node: NodeId) -> Result<Vec<VarId>> {
        let references: Vec<VarId> = self
            .get_all_variables_in_subtree(node, VariableFilter::References)
            .collect();
        let mut unresolved = Vec::new();
        for r in references {
            if self.variable(r)?.bound_value().is_none() && self.resolve_reference(r)?.is_none() {
                unresolved.push(r);
            }
        }
        Ok(unresolved)
    }

    /// References under `node` bound to a value they can no longer see.
    pub fn dangling_references(&self, node: NodeId) -> Result<Vec<VarId>> {
        let mut dangling = Vec::new();
        for r in self.get_all_variables_in_subtree(node, VariableFilter::References) {
            if let Some(value) = self.variable(r)?.bound_value() {
                if !self.get_visible_values(r)?.contains(&value) {
                    dangling.push(r);
                }
            }
        }
        Ok(dangling)
    }

    /// Whether `reference` still resolves, by name, to the value it is bound
    /// to. Unbound references trivially do.
    pub(crate) fn reference_resolves(&self, reference: VarId) -> Result<bool> {
        let Some(value) = self.variable(reference)?.bound_value() else {
            return Ok(true);
        };
        let env = self.reference_env(reference, "reference_resolves")?;
        let name = &self.variable(value)?.name;
        Ok(env.get(name) == Some(&value))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Edge bookkeeping (both sides, never verified in between)
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn link(&mut self, reference: VarId, value: VarId) -> Result<()> {
        self.unlink(reference)?;
        let name = self.variable(value)?.name.clone();
        if let VariableKind::Value { references, .. } = &mut self.variable_mut(value)?.kind {
            references.insert(reference);
        }
        let var = self.variable_mut(reference)?;
        var.name = name;
        if let VariableKind::Reference { bound_value } = &mut var.kind {
            *bound_value = Some(value);
        }
        debug!(reference = %reference, value = %value, "bound reference");
        Ok(())
    }

    pub(crate) fn unlink(&mut self, reference: VarId) -> Result<Option<VarId>> {
        let Some(value) = self.variable(reference)?.bound_value() else {
            return Ok(None);
        };
        let mut last_name = None;
        if let Some(decl) = self.variables.get_mut(&value) {
            last_name = Some(decl.name.clone());
            if let VariableKind::Value { references, .. } = &mut decl.kind {
                references.shift_remove(&reference);
            }
        }
        let var = self.variable_mut(reference)?;
        if let Some(name) = last_name {
            var.name = name;
        }
        if let VariableKind::Reference { bound_value } = &mut var.kind {
            *bound_value = None;
        }
        trace!(reference = %reference, value = %value, "unbound reference");
        Ok(Some(value))
    }

    /// Unbind every reference bound to `value`.
    pub(crate) fn unlink_value(&mut self, value: VarId) -> Result<Vec<VarId>> {
        let references: Vec<VarId> = self.variable(value)?.references().collect();
        for &r in &references {
            self.unlink(r)?;
        }
        Ok(references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_shadowing() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let outer = forest.lambda(ws, "x").unwrap();
        let inner = forest.lambda(ws, "x").unwrap();
        forest.connect(inner, outer, "RETURN").unwrap();

        let env = forest.visible_variables_at(inner, "RETURN").unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("x").copied(), forest.value_of(inner, "VAR"));
    }

    #[test]
    fn test_scope_input_matters() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let let_node = forest.let_binding(ws, "f", &["a"]).unwrap();

        let exp1 = forest.visible_variables_at(let_node, "EXP1").unwrap();
        let exp2 = forest.visible_variables_at(let_node, "EXP2").unwrap();
        assert_eq!(exp1.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(exp2.keys().collect::<Vec<_>>(), vec!["f"]);
    }

    #[test]
    fn test_slotted_name_outlives_cleared_database() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        forest.lambda(ws, "x").unwrap();
        forest.clear_workspace_db(ws).unwrap();

        assert!(forest.is_unique_name("x", ws).unwrap());
        assert!(forest.is_slotted_name("x", ws).unwrap());
        assert!(!forest.is_slotted_name("y", ws).unwrap());
    }

    #[test]
    fn test_subtree_variables_are_lazy() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let outer = forest.lambda(ws, "a").unwrap();
        let inner = forest.lambda(ws, "b").unwrap();
        forest.connect(inner, outer, "RETURN").unwrap();

        let mut vars = forest.get_all_variables_in_subtree(outer, VariableFilter::Values);
        assert_eq!(vars.next(), forest.value_of(outer, "VAR"));
        assert_eq!(vars.next(), forest.value_of(inner, "VAR"));
        assert_eq!(vars.next(), None);
    }

    #[test]
    fn test_unlink_keeps_last_name() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let lambda = forest.lambda(ws, "x").unwrap();
        let get = forest.var_get(ws, "x").unwrap();
        forest.connect(get, lambda, "RETURN").unwrap();
        let r = forest.reference_of(get).unwrap();
        let v = forest.value_of(lambda, "VAR").unwrap();

        forest.bind_reference(r, v).unwrap();
        forest.variable_mut(v).unwrap().name = "y".to_string();
        assert_eq!(forest.variable_name(r).unwrap(), "y");

        assert_eq!(forest.unbind_reference(r).unwrap(), Some(v));
        assert_eq!(forest.variable_name(r).unwrap(), "y");
        assert_eq!(forest.variable(v).unwrap().reference_count(), 0);
    }
}
