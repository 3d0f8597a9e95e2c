//! Registration state machine for variables

use crate::error::{BindingError, Result};
use crate::variable::VarId;
use crate::workspace::WorkspaceId;

/// Where a variable currently lives.
///
/// ```text
///             attach_to_slot            register(ws)
/// Unattached ───────────────► AttachedToSlot ───────────► Registered(ws)
///     ▲                         │      ▲                     │
///     └──── detach_from_slot ───┘      └──── unregister ─────┘
/// ```
///
/// References skip `AttachedToSlot` and go straight between `Unattached`
/// and `Registered(ws)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Membership {
    /// In no slot and no database
    #[default]
    Unattached,

    /// In its owner slot but not in a workspace database (values only)
    AttachedToSlot,

    /// In its owner slot (values) and in the given workspace's database
    Registered(WorkspaceId),
}

impl Membership {
    /// Whether the variable occupies its owner slot.
    pub fn in_owner_slot(self) -> bool {
        !matches!(self, Membership::Unattached)
    }

    /// Whether the variable is in a workspace database.
    pub fn in_workspace_db(self) -> bool {
        matches!(self, Membership::Registered(_))
    }

    /// The workspace whose database holds the variable, if any.
    pub fn workspace(self) -> Option<WorkspaceId> {
        match self {
            Membership::Registered(ws) => Some(ws),
            _ => None,
        }
    }

    pub(crate) fn attach_to_slot(&mut self, id: VarId) -> Result<()> {
        match *self {
            Membership::Unattached => {
                *self = Membership::AttachedToSlot;
                Ok(())
            }
            other => Err(illegal(id, "attach to slot", other)),
        }
    }

    pub(crate) fn detach_from_slot(&mut self, id: VarId) -> Result<()> {
        match *self {
            Membership::AttachedToSlot => {
                *self = Membership::Unattached;
                Ok(())
            }
            other => Err(illegal(id, "detach from slot", other)),
        }
    }

    /// Enter a workspace database. `slotted` says whether the variable has
    /// an owner slot (values) or not (references).
    pub(crate) fn register(&mut self, id: VarId, ws: WorkspaceId, slotted: bool) -> Result<()> {
        match (*self, slotted) {
            (Membership::AttachedToSlot, true) | (Membership::Unattached, false) => {
                *self = Membership::Registered(ws);
                Ok(())
            }
            (other, _) => Err(illegal(id, "register", other)),
        }
    }

    pub(crate) fn unregister(&mut self, id: VarId, ws: WorkspaceId, slotted: bool) -> Result<()> {
        match *self {
            Membership::Registered(current) if current == ws => {
                *self = if slotted {
                    Membership::AttachedToSlot
                } else {
                    Membership::Unattached
                };
                Ok(())
            }
            other => Err(illegal(id, "unregister", other)),
        }
    }
}

fn illegal(id: VarId, transition: &str, state: Membership) -> BindingError {
    BindingError::inconsistent(id, format!("cannot {} while {:?}", transition, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_round_trip() {
        let id = VarId::from_raw(1);
        let ws = WorkspaceId::from_raw(1);
        let mut m = Membership::default();

        m.attach_to_slot(id).unwrap();
        assert!(m.in_owner_slot());
        assert!(!m.in_workspace_db());

        m.register(id, ws, true).unwrap();
        assert_eq!(m.workspace(), Some(ws));

        m.unregister(id, ws, true).unwrap();
        assert_eq!(m, Membership::AttachedToSlot);
        m.detach_from_slot(id).unwrap();
        assert_eq!(m, Membership::Unattached);
    }

    #[test]
    fn test_reference_skips_slot() {
        let id = VarId::from_raw(2);
        let ws = WorkspaceId::from_raw(1);
        let mut m = Membership::default();

        m.register(id, ws, false).unwrap();
        assert!(m.in_workspace_db());
        m.unregister(id, ws, false).unwrap();
        assert_eq!(m, Membership::Unattached);
    }

    #[test]
    fn test_illegal_transitions() {
        let id = VarId::from_raw(3);
        let ws = WorkspaceId::from_raw(1);
        let other = WorkspaceId::from_raw(2);
        let mut m = Membership::default();

        assert!(m.register(id, ws, true).is_err());
        assert!(m.detach_from_slot(id).is_err());
        assert!(m.unregister(id, ws, false).is_err());

        m.register(id, ws, false).unwrap();
        assert!(m.unregister(id, other, false).is_err());
        assert!(m.attach_to_slot(id).is_err());
    }
}
