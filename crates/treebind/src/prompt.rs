//! Interactive rename loop

use tracing::debug;

use crate::binding::RenameOutcome;
use crate::error::Result;
use crate::forest::Forest;
use crate::variable::VarId;

/// Something that can ask the user for a name and show them an error.
pub trait NamePrompt {
    /// Ask for a name. `None` (or an empty answer) means the user cancelled.
    fn prompt(&mut self, message: &str, default: &str) -> Option<String>;

    /// Show a message; returns once the user has dismissed it.
    fn alert(&mut self, message: &str);
}

impl Forest {
    /// Ask for a new name for `var` until a rename succeeds or the user
    /// cancels. Returns whether the variable was renamed.
    pub fn rename_interactive(&mut self, var: VarId, prompt: &mut dyn NamePrompt) -> Result<bool> {
        loop {
            let message = format!("Rename all '{}' variables to:", self.variable_name(var)?);
            let answer = match prompt.prompt(&message, "") {
                Some(answer) if !answer.is_empty() => answer,
                _ => {
                    debug!(var = %var, "rename cancelled");
                    return Ok(false);
                }
            };
            match self.rename(var, &answer)? {
                RenameOutcome::Renamed { .. } => return Ok(true),
                RenameOutcome::Rejected(reason) => {
                    prompt.alert(&format!("Invalid variable name! {}", reason));
                }
            }
        }
    }
}
