//! TypedLang source generation
//!
//! A read-only consumer of the tree: it asks the forest for display names
//! and never touches the binding databases.

use crate::error::{BindingError, Result};
use crate::forest::Forest;
use crate::tree::{NodeId, NodeKind};

impl Forest {
    /// Render the expression rooted at `node` as TypedLang source.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` for `let rec`.
    pub fn generate(&self, node: NodeId) -> Result<String> {
        Generator { forest: self }.expr(node)
    }
}

struct Generator<'a> {
    forest: &'a Forest,
}

impl Generator<'_> {
    fn expr(&self, id: NodeId) -> Result<String> {
        let node = self.forest.node(id)?;
        let code = match node.kind() {
            NodeKind::Bool(b) => b.to_string(),
            NodeKind::Int(n) => n.to_string(),
            NodeKind::Float(x) => format!("{:?}", x),
            NodeKind::Compare(op) => format!(
                "{} {} {}",
                self.operand(id, "A", "0")?,
                op.symbol(),
                self.operand(id, "B", "0")?
            ),
            NodeKind::IntArith(op) => format!(
                "{} {} {}",
                self.operand(id, "A", "0")?,
                op.int_symbol(),
                self.operand(id, "B", "0")?
            ),
            NodeKind::FloatArith(op) => format!(
                "{} {} {}",
                self.operand(id, "A", "0.")?,
                op.float_symbol(),
                self.operand(id, "B", "0.")?
            ),
            NodeKind::Ternary => format!(
                "{} ? {} : {}",
                self.input(id, "IF", "false")?,
                self.input(id, "THEN", "null")?,
                self.input(id, "ELSE", "null")?
            ),
            NodeKind::List { items } => {
                let elements = (0..*items)
                    .map(|i| self.input(id, &format!("ADD{}", i), "null"))
                    .collect::<Result<Vec<_>>>()?;
                format!("[{}]", elements.join(", "))
            }
            NodeKind::Pair => format!(
                "({}, {})",
                self.input(id, "FIRST", "()")?,
                self.input(id, "SECOND", "()")?
            ),
            NodeKind::Fst => format!("fst {}", self.operand(id, "FIRST", "()")?),
            NodeKind::Snd => format!("snd {}", self.operand(id, "SECOND", "()")?),
            NodeKind::Lambda => format!(
                "fun {} -> {}",
                self.slot_name(id, "VAR")?,
                self.input(id, "RETURN", "()")?
            ),
            NodeKind::App => format!(
                "{} {}",
                self.operand(id, "FUN", "()")?,
                self.operand(id, "ARG", "()")?
            ),
            NodeKind::Match { arms } => {
                let mut code = format!("match {} with\n", self.input(id, "INPUT", "()")?);
                for arm in 1..=*arms {
                    code.push_str(&format!(
                        "  | {} -> {}\n",
                        self.pattern(id, arm)?,
                        self.input(id, &format!("OUTPUT{}", arm), "()")?
                    ));
                }
                code
            }
            NodeKind::VarGet => match self.forest.reference_of(id) {
                Some(r) => self.forest.variable_name(r)?.to_string(),
                None => "_".to_string(),
            },
            NodeKind::Let { args } => {
                let mut head = self.slot_name(id, "VAR")?;
                for i in 0..*args {
                    head.push(' ');
                    head.push_str(&self.slot_name(id, &format!("ARG{}", i))?);
                }
                format!(
                    "let {} = {} in {}",
                    head,
                    self.input(id, "EXP1", "()")?,
                    self.input(id, "EXP2", "()")?
                )
            }
            NodeKind::LetRec => {
                return Err(BindingError::unsupported(
                    "generate",
                    "code generation for `let rec` is not implemented",
                ))
            }
        };
        Ok(code)
    }

    /// Code of the child in `input`, or `default` if nothing is plugged in.
    fn input(&self, id: NodeId, input: &str, default: &str) -> Result<String> {
        match self.forest.node(id)?.input(input) {
            Some(child) => self.expr(child),
            None => Ok(default.to_string()),
        }
    }

    /// Like `input`, parenthesised unless the child is atomic.
    fn operand(&self, id: NodeId, input: &str, default: &str) -> Result<String> {
        let Some(child) = self.forest.node(id)?.input(input) else {
            return Ok(default.to_string());
        };
        let code = self.expr(child)?;
        Ok(if is_atomic(self.forest.node(child)?.kind()) {
            code
        } else {
            format!("({})", code)
        })
    }

    fn slot_name(&self, id: NodeId, field: &str) -> Result<String> {
        let node = self.forest.node(id)?;
        match node.value_slot(field).or_else(|| node.declared_variable(field)) {
            Some(var) => Ok(self.forest.variable_name(var)?.to_string()),
            None => Ok("_".to_string()),
        }
    }

    fn pattern(&self, id: NodeId, arm: usize) -> Result<String> {
        let prefix = format!("PATTERN{}_", arm);
        let names = self
            .forest
            .node(id)?
            .declared_variables()
            .filter(|(field, _)| field.starts_with(&prefix))
            .map(|(_, var)| self.forest.variable_name(var).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        Ok(match names.len() {
            0 => "_".to_string(),
            1 => names.join(""),
            _ => format!("({})", names.join(", ")),
        })
    }
}

fn is_atomic(kind: &NodeKind) -> bool {
    match kind {
        NodeKind::Int(n) => *n >= 0,
        NodeKind::Float(x) => *x >= 0.0,
        NodeKind::Bool(_)
        | NodeKind::List { .. }
        | NodeKind::Pair
        | NodeKind::VarGet => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ArithOp;

    #[test]
    fn test_arithmetic_defaults() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let add = forest.create_node(ws, NodeKind::IntArith(ArithOp::Add)).unwrap();
        let fadd = forest.create_node(ws, NodeKind::FloatArith(ArithOp::Multiply)).unwrap();
        assert_eq!(forest.generate(add).unwrap(), "0 + 0");
        assert_eq!(forest.generate(fadd).unwrap(), "0. *. 0.");
    }

    #[test]
    fn test_negative_operand_parenthesised() {
        let mut forest = Forest::new();
        let ws = forest.create_workspace(None).unwrap();
        let sub = forest.create_node(ws, NodeKind::IntArith(ArithOp::Minus)).unwrap();
        let neg = forest.create_node(ws, NodeKind::Int(-3)).unwrap();
        forest.connect(neg, sub, "B").unwrap();
        assert_eq!(forest.generate(sub).unwrap(), "0 - (-3)");
    }
}
