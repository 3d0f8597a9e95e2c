//! Variable entities: values (declarations) and references (uses)

mod membership;

pub use membership::Membership;

use indexmap::IndexSet;
use std::fmt;

use crate::id::define_id;
use crate::tree::NodeId;

define_id!(
    /// Process-unique identifier of a variable.
    VarId,
    "var"
);

/// A declared or inferred type, uninterpreted by the binding engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeExpr(pub String);

impl TypeExpr {
    /// Create a type expression from its textual form.
    pub fn new(text: impl Into<String>) -> Self {
        TypeExpr(text.into())
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The binding role of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A binding site
    Value,
    /// An occurrence that must resolve to a value
    Reference,
}

/// Which roles to collect when enumerating variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableFilter {
    /// Only references
    References,
    /// Only values
    Values,
    /// Both roles
    #[default]
    All,
}

impl VariableFilter {
    /// Whether a variable of `role` passes this filter.
    pub fn accepts(self, role: Role) -> bool {
        match self {
            VariableFilter::References => role == Role::Reference,
            VariableFilter::Values => role == Role::Value,
            VariableFilter::All => true,
        }
    }
}

/// Role-specific state.
#[derive(Debug, Clone)]
pub enum VariableKind {
    /// Declaration side of a binding edge
    Value {
        /// Input of the source node on which the value is visible
        scope_input: String,
        /// References currently bound to this value
        references: IndexSet<VarId>,
    },

    /// Use side of a binding edge
    Reference {
        /// The value this reference resolves to, if any
        bound_value: Option<VarId>,
    },
}

/// A variable owned by a tree node.
#[derive(Debug, Clone)]
pub struct Variable {
    id: VarId,
    pub(crate) name: String,
    source_node: NodeId,
    field_name: String,
    type_expr: TypeExpr,
    pub(crate) membership: Membership,
    pub(crate) kind: VariableKind,
}

impl Variable {
    pub(crate) fn new_value(
        node: NodeId,
        field_name: impl Into<String>,
        type_expr: TypeExpr,
        scope_input: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: VarId::fresh(),
            name: name.into(),
            source_node: node,
            field_name: field_name.into(),
            type_expr,
            membership: Membership::Unattached,
            kind: VariableKind::Value {
                scope_input: scope_input.into(),
                references: IndexSet::new(),
            },
        }
    }

    pub(crate) fn new_reference(
        node: NodeId,
        field_name: impl Into<String>,
        type_expr: TypeExpr,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: VarId::fresh(),
            name: name.into(),
            source_node: node,
            field_name: field_name.into(),
            type_expr,
            membership: Membership::Unattached,
            kind: VariableKind::Reference { bound_value: None },
        }
    }

    /// The variable's identifier.
    pub fn id(&self) -> VarId {
        self.id
    }

    /// The stored name. For a bound reference the display name is the
    /// value's; use [`Forest::variable_name`](crate::Forest::variable_name).
    pub fn own_name(&self) -> &str {
        &self.name
    }

    /// The node that owns this variable.
    pub fn source_node(&self) -> NodeId {
        self.source_node
    }

    /// The field slot on the source node holding this variable.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The declared type.
    pub fn type_expr(&self) -> &TypeExpr {
        &self.type_expr
    }

    /// Current registration state.
    pub fn membership(&self) -> Membership {
        self.membership
    }

    /// The binding role.
    pub fn role(&self) -> Role {
        match self.kind {
            VariableKind::Value { .. } => Role::Value,
            VariableKind::Reference { .. } => Role::Reference,
        }
    }

    /// Whether this is a reference.
    pub fn is_reference(&self) -> bool {
        self.role() == Role::Reference
    }

    /// Whether this is a value.
    pub fn is_value(&self) -> bool {
        self.role() == Role::Value
    }

    /// Scope input of a value; `None` for references.
    pub fn scope_input(&self) -> Option<&str> {
        match &self.kind {
            VariableKind::Value { scope_input, .. } => Some(scope_input),
            VariableKind::Reference { .. } => None,
        }
    }

    /// Value this reference is bound to; always `None` for values.
    pub fn bound_value(&self) -> Option<VarId> {
        match self.kind {
            VariableKind::Reference { bound_value } => bound_value,
            VariableKind::Value { .. } => None,
        }
    }

    /// References bound to this value, in binding order. Empty for references.
    pub fn references(&self) -> impl Iterator<Item = VarId> + '_ {
        let refs = match &self.kind {
            VariableKind::Value { references, .. } => Some(references.iter().copied()),
            VariableKind::Reference { .. } => None,
        };
        refs.into_iter().flatten()
    }

    /// Number of references bound to this value.
    pub fn reference_count(&self) -> usize {
        match &self.kind {
            VariableKind::Value { references, .. } => references.len(),
            VariableKind::Reference { .. } => 0,
        }
    }
}
