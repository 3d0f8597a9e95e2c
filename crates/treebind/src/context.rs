//! Binding engine configuration

/// How a value may use the wildcard name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WildcardPolicy {
    /// The wildcard is never a legal value name
    #[default]
    Reject,

    /// A value may become the wildcard while no reference is bound to it.
    /// Wildcard values bind nothing in scope.
    AllowUnreferenced,
}

/// Configuration for a [`Forest`](crate::Forest).
///
/// Controls the reserved wildcard spelling and how strictly invariants are
/// re-checked.
#[derive(Debug, Clone)]
pub struct BindingOptions {
    /// The reserved "don't care" name
    pub wildcard: String,

    /// Whether values may be renamed to the wildcard
    pub wildcard_policy: WildcardPolicy,

    /// Re-verify every invariant after each mutating operation
    pub verify_invariants: bool,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            wildcard: "_".to_string(),
            wildcard_policy: WildcardPolicy::Reject,
            verify_invariants: cfg!(debug_assertions),
        }
    }
}

impl BindingOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options with a given wildcard policy.
    pub fn with_wildcard_policy(policy: WildcardPolicy) -> Self {
        Self {
            wildcard_policy: policy,
            ..Default::default()
        }
    }

    /// Enable or disable post-mutation invariant checks.
    pub fn verify(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }

    /// Check whether a name is the reserved wildcard.
    pub fn is_wildcard(&self, name: &str) -> bool {
        name == self.wildcard
    }
}
