//! The binding engine
//!
//! All operations are methods on [`Forest`](crate::Forest), split by concern:
//!
//! - `registry`: owner slots and per-workspace databases
//! - `scope`: visibility, lookup and binding edges
//! - `rename`: capture-free renaming via a speculative, self-restoring trial rename
//! - `cyclic`: severing edges when subtrees are deleted or detached
//! - `verify`: whole-forest invariant checks

mod cyclic;
mod registry;
mod rename;
mod scope;
mod verify;

pub use rename::{is_identifier, normalize_name, RenameOutcome, RenameRejection};
pub use scope::Env;
