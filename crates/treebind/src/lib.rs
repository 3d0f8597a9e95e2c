//! # Treebind
//!
//! Variable binding and scope resolution for an editable tree of typed
//! functional-language nodes (let-bindings, lambdas, pattern matches).
//!
//! Every binding has one declaring node (a **value**) and any number of
//! using nodes (**references**). Treebind keeps that relation consistent
//! while the tree is edited: nodes are created, connected, disconnected,
//! deleted and renamed, and a reference is never left pointing at a
//! destroyed or out-of-scope value.
//!
//! ## Architecture
//!
//! - **Forest**: arena owning workspaces, nodes and variables
//! - **Workspaces**: editing surfaces, each owning a value and a reference
//!   database; related surfaces form a family sharing one naming domain
//! - **Binding engine**: registration, visibility, binding edges
//! - **Rename analyzer**: speculative rename, re-resolution, rollback
//! - **Cyclic cleaner**: severs edges internal to a subtree being removed
//! - **Code generator**: TypedLang text from a resolved tree
//!
//! ## Example
//!
//! ```
//! use treebind::{Forest, RenameOutcome};
//!
//! let mut forest = Forest::new();
//! let ws = forest.create_workspace(None).unwrap();
//!
//! // let x = 1 in x
//! let let_x = forest.let_binding(ws, "x", &[]).unwrap();
//! let one = forest.create_node(ws, treebind::NodeKind::Int(1)).unwrap();
//! let use_x = forest.var_get(ws, "x").unwrap();
//! forest.connect(one, let_x, "EXP1").unwrap();
//! forest.connect(use_x, let_x, "EXP2").unwrap();
//! forest.resolve_subtree(let_x).unwrap();
//!
//! let x = forest.value_of(let_x, "VAR").unwrap();
//! assert!(forest.rename(x, "y").unwrap().is_renamed());
//! assert_eq!(forest.generate(let_x).unwrap(), "let y = 1 in y");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod id;

pub mod binding;
pub mod codegen;
pub mod context;
pub mod error;
pub mod forest;
pub mod prompt;
pub mod tree;
pub mod variable;
pub mod workspace;

// Re-export main types
pub use binding::{Env, RenameOutcome, RenameRejection};
pub use context::{BindingOptions, WildcardPolicy};
pub use error::{BindingError, NameError, Result};
pub use forest::Forest;
pub use prompt::NamePrompt;
pub use tree::{ArithOp, CompareOp, Connection, Node, NodeId, NodeKind, Walk};
pub use variable::{Membership, Role, TypeExpr, VarId, Variable, VariableFilter};
pub use workspace::{VariableDb, Workspace, WorkspaceId};

/// Treebind version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
