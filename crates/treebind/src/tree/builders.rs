//! Constructors for the binder-carrying node kinds
//!
//! Names are checked and stripped of whitespace before any node is created,
//! so a refused name leaves the forest untouched.

use crate::error::{BindingError, Result};
use crate::forest::Forest;
use crate::tree::{NodeId, NodeKind};
use crate::variable::{Role, TypeExpr, VarId};
use crate::workspace::WorkspaceId;

impl Forest {
    /// `fun name -> RETURN`. The parameter is visible in `RETURN`.
    pub fn lambda(&mut self, ws: WorkspaceId, name: &str) -> Result<NodeId> {
        let name = self.checked_initial_name(name, Role::Value)?;
        let node = self.create_node(ws, NodeKind::Lambda)?;
        self.create_value(node, "VAR", TypeExpr::default(), "RETURN", &name)?;
        self.register_node_variables(node)?;
        Ok(node)
    }

    /// `let name args.. = EXP1 in EXP2`.
    ///
    /// `name` is visible in `EXP2`; each argument `ARGi` is visible in
    /// `EXP1`.
    pub fn let_binding(&mut self, ws: WorkspaceId, name: &str, args: &[&str]) -> Result<NodeId> {
        let name = self.checked_initial_name(name, Role::Value)?;
        let args = args
            .iter()
            .map(|arg| self.checked_initial_name(arg, Role::Value))
            .collect::<Result<Vec<_>>>()?;
        let node = self.create_node(ws, NodeKind::Let { args: args.len() })?;
        self.create_value(node, "VAR", TypeExpr::default(), "EXP2", &name)?;
        for (i, arg) in args.iter().enumerate() {
            self.create_value(node, &format!("ARG{}", i), TypeExpr::default(), "EXP1", arg)?;
        }
        self.register_node_variables(node)?;
        Ok(node)
    }

    /// `let rec`. Its binder would have to be visible in both of its own
    /// inputs, which single-input scoping cannot express.
    pub fn let_rec(&mut self, _ws: WorkspaceId, name: &str) -> Result<NodeId> {
        Err(BindingError::unsupported(
            "let_rec",
            format!("recursive binding of `{}` is not implemented", name),
        ))
    }

    /// `match INPUT with | p1 -> OUTPUT1 | p2 -> OUTPUT2 ..`.
    ///
    /// Arm `i` (1-based) binds the names in `arms[i - 1]` as values in slots
    /// `PATTERNi_j`, all visible in `OUTPUTi`.
    pub fn match_expr(&mut self, ws: WorkspaceId, arms: &[&[&str]]) -> Result<NodeId> {
        let arms = arms
            .iter()
            .map(|names| {
                names
                    .iter()
                    .map(|name| self.checked_initial_name(name, Role::Value))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let node = self.create_node(ws, NodeKind::Match { arms: arms.len() })?;
        for (i, names) in arms.iter().enumerate() {
            let scope = format!("OUTPUT{}", i + 1);
            for (j, name) in names.iter().enumerate() {
                let field = format!("PATTERN{}_{}", i + 1, j);
                self.create_value(node, &field, TypeExpr::default(), &scope, name)?;
            }
        }
        self.register_node_variables(node)?;
        Ok(node)
    }

    /// A variable occurrence named `name`, initially unbound.
    pub fn var_get(&mut self, ws: WorkspaceId, name: &str) -> Result<NodeId> {
        let name = self.checked_initial_name(name, Role::Reference)?;
        let node = self.create_node(ws, NodeKind::VarGet)?;
        self.create_reference(node, "VAR", TypeExpr::default(), &name)?;
        self.register_node_variables(node)?;
        Ok(node)
    }

    /// The value registered in `field` of `node`.
    pub fn value_of(&self, node: NodeId, field: &str) -> Option<VarId> {
        self.nodes.get(&node).and_then(|n| n.value_slot(field))
    }

    /// The reference held by a variable-occurrence node.
    pub fn reference_of(&self, node: NodeId) -> Option<VarId> {
        let n = self.nodes.get(&node)?;
        n.declared_variables()
            .map(|(_, id)| id)
            .find(|id| self.variables.get(id).is_some_and(|v| v.is_reference()))
    }
}
