//! Capture-free renaming
//!
//! A rename is accepted only if every reference that depends on the renamed
//! declaration still resolves to the same value afterwards. The check runs
//! the ordinary scope resolution against a speculatively renamed forest.

use std::fmt;
use std::ops::Deref;

use tracing::{debug, trace};

use crate::context::WildcardPolicy;
use crate::error::{NameError, Result};
use crate::forest::Forest;
use crate::variable::{Role, VarId, VariableFilter};

/// Why a rename was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameRejection {
    /// The name itself is not acceptable
    InvalidName(NameError),
    /// Some reference would resolve to a different value
    Capture,
}

impl fmt::Display for RenameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameRejection::InvalidName(err) => write!(f, "{}", err),
            RenameRejection::Capture => f.write_str("the new name would capture another variable"),
        }
    }
}

/// Result of [`Forest::rename`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The declaration now carries `to`
    Renamed {
        /// Previous name
        from: String,
        /// New name
        to: String,
    },
    /// Nothing changed
    Rejected(RenameRejection),
}

impl RenameOutcome {
    /// Whether the rename happened.
    pub fn is_renamed(&self) -> bool {
        matches!(self, RenameOutcome::Renamed { .. })
    }
}

/// Strip all whitespace from a candidate name.
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `[a-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Temporarily renames one declaration; the original name comes back when
/// the trial is dropped, on every exit path.
///
/// Only shared access to the forest is handed out while the trial lives.
struct TrialRename<'a> {
    forest: &'a mut Forest,
    target: VarId,
    original: String,
}

impl<'a> TrialRename<'a> {
    fn new(forest: &'a mut Forest, target: VarId, name: String) -> Result<Self> {
        let var = forest.variable_mut(target)?;
        let original = std::mem::replace(&mut var.name, name);
        Ok(Self {
            forest,
            target,
            original,
        })
    }
}

impl Drop for TrialRename<'_> {
    fn drop(&mut self) {
        if let Some(var) = self.forest.variables.get_mut(&self.target) {
            var.name = std::mem::take(&mut self.original);
        }
    }
}

impl Deref for TrialRename<'_> {
    type Target = Forest;

    fn deref(&self) -> &Self::Target {
        self.forest
    }
}

impl Forest {
    /// Why `name` is not a legal name for `var`, if it is not.
    pub fn name_violation(&self, var: VarId, name: &str) -> Result<Option<NameError>> {
        let variable = self.variable(var)?;
        Ok(self.check_name(&normalize_name(name), variable.role(), variable.reference_count()))
    }

    /// `name` with whitespace stripped, if it is legal for a new variable
    /// of `role`.
    pub(crate) fn checked_initial_name(&self, name: &str, role: Role) -> Result<String> {
        let name = normalize_name(name);
        match self.check_name(&name, role, 0) {
            Some(err) => Err(err.into()),
            None => Ok(name),
        }
    }

    fn check_name(&self, name: &str, role: Role, reference_count: usize) -> Option<NameError> {
        if name.is_empty() {
            return Some(NameError::Empty);
        }
        if !is_identifier(name) {
            return Some(NameError::Malformed(name.to_string()));
        }
        if !self.options().is_wildcard(name) {
            return None;
        }
        match role {
            Role::Reference => Some(NameError::WildcardReference(name.to_string())),
            Role::Value => match self.options().wildcard_policy {
                WildcardPolicy::AllowUnreferenced if reference_count == 0 => None,
                _ => Some(NameError::WildcardValue(name.to_string())),
            },
        }
    }

    /// Structural legality of `name` for `var`; says nothing about capture.
    pub fn is_legal_name(&self, var: VarId, name: &str) -> Result<bool> {
        Ok(self.name_violation(var, name)?.is_none())
    }

    /// Whether renaming `var` to `new_name` keeps every dependent reference
    /// bound to the same value. Leaves the forest exactly as it found it.
    pub fn can_rename_to(&mut self, var: VarId, new_name: &str) -> Result<bool> {
        if !self.is_legal_name(var, new_name)? {
            return Ok(false);
        }
        let new_name = normalize_name(new_name);
        let target = self.name_target(var)?;
        let decl = self.variable(target)?;
        if decl.name == new_name {
            return Ok(true);
        }
        let ws = self.node(decl.source_node())?.workspace();
        if self.is_unique_name(&new_name, ws)? && !self.is_slotted_name(&new_name, ws)? {
            trace!(var = %var, name = %new_name, "rename target is unique");
            return Ok(true);
        }

        let bound = self.get_all_bound_variables(var)?;
        let roots = self.get_all_root_blocks(&bound, false)?;
        let trial = TrialRename::new(self, target, new_name)?;
        for root in roots {
            if trial.is_preview_tree(root)? {
                continue;
            }
            for r in trial.get_all_variables_in_subtree(root, VariableFilter::References) {
                if !trial.reference_resolves(r)? {
                    debug!(var = %var, reference = %r, root = %root, "rename would capture");
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Rename `var` if that is legal and capture-free. Renaming a bound
    /// reference renames its value.
    pub fn rename(&mut self, var: VarId, new_name: &str) -> Result<RenameOutcome> {
        if let Some(err) = self.name_violation(var, new_name)? {
            return Ok(RenameOutcome::Rejected(RenameRejection::InvalidName(err)));
        }
        if !self.can_rename_to(var, new_name)? {
            return Ok(RenameOutcome::Rejected(RenameRejection::Capture));
        }

        let to = normalize_name(new_name);
        let target = self.name_target(var)?;
        let from = std::mem::replace(&mut self.variable_mut(target)?.name, to.clone());
        if let Err(err) = self.check_after_mutation() {
            self.variable_mut(target)?.name = from;
            return Err(err);
        }
        debug!(var = %target, %from, %to, "renamed");
        Ok(RenameOutcome::Renamed { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BindingOptions;
    use crate::error::BindingError;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("x"));
        assert!(is_identifier("_tmp1"));
        assert!(is_identifier("camelCase"));
        assert!(!is_identifier("X"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  fo o\t"), "foo");
        assert_eq!(normalize_name(" \n "), "");
    }

    #[test]
    fn test_trial_restores_on_drop() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let lambda = forest.lambda(ws, "x").unwrap();
        let v = forest.value_of(lambda, "VAR").unwrap();

        {
            let trial = TrialRename::new(&mut forest, v, "y".to_string()).unwrap();
            assert_eq!(trial.variable_name(v).unwrap(), "y");
        }
        assert_eq!(forest.variable_name(v).unwrap(), "x");
    }

    #[test]
    fn test_failed_post_check_restores_name() {
        let mut forest = Forest::with_options(BindingOptions::new().verify(false));
        let ws = forest.create_workspace(None).unwrap();
        let lambda = forest.lambda(ws, "x").unwrap();
        let get = forest.var_get(ws, "x").unwrap();
        forest.connect(get, lambda, "RETURN").unwrap();
        forest.resolve_subtree(lambda).unwrap();
        // leave a binding that can no longer see its value
        forest.detach(get).unwrap();

        let other = forest.lambda(ws, "a").unwrap();
        let a = forest.value_of(other, "VAR").unwrap();
        forest.options.verify_invariants = true;

        assert!(matches!(
            forest.rename(a, "b"),
            Err(BindingError::InconsistentState { .. })
        ));
        assert_eq!(forest.variable_name(a).unwrap(), "a");
    }

    #[test]
    fn test_initial_name_checks() {
        let forest = Forest::new();
        assert_eq!(forest.checked_initial_name(" f oo ", Role::Value).unwrap(), "foo");
        assert_eq!(
            forest.checked_initial_name("Bad", Role::Value),
            Err(BindingError::InvalidName(NameError::Malformed("Bad".to_string())))
        );
        assert_eq!(
            forest.checked_initial_name("_", Role::Reference),
            Err(BindingError::InvalidName(NameError::WildcardReference("_".to_string())))
        );
    }

    #[test]
    fn test_trial_restores_on_unwind() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let lambda = forest.lambda(ws, "x").unwrap();
        let v = forest.value_of(lambda, "VAR").unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _trial = TrialRename::new(&mut forest, v, "y".to_string()).unwrap();
            panic!("trial aborted");
        }));
        assert!(result.is_err());
        assert_eq!(forest.variable_name(v).unwrap(), "x");
    }
}
