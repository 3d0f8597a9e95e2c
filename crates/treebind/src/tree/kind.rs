//! Node kinds of the TypedLang block set

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl CompareOp {
    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

/// Arithmetic operators, shared by the int and float forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// Addition
    Add,
    /// Subtraction
    Minus,
    /// Multiplication
    Multiply,
    /// Division
    Divide,
}

impl ArithOp {
    /// Source spelling for integers.
    pub fn int_symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Minus => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
        }
    }

    /// Source spelling for floats.
    pub fn float_symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+.",
            ArithOp::Minus => "-.",
            ArithOp::Multiply => "*.",
            ArithOp::Divide => "/.",
        }
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `true` / `false`
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// `A op B`
    Compare(CompareOp),
    /// `IF ? THEN : ELSE`
    Ternary,
    /// Integer arithmetic on `A` and `B`
    IntArith(ArithOp),
    /// Float arithmetic on `A` and `B`
    FloatArith(ArithOp),
    /// List literal with `ADD0..ADDn` inputs
    List {
        /// Number of element inputs
        items: usize,
    },
    /// `(FIRST, SECOND)`
    Pair,
    /// `fst FIRST`
    Fst,
    /// `snd SECOND`
    Snd,
    /// `fun VAR -> RETURN`
    Lambda,
    /// `FUN ARG`
    App,
    /// `match INPUT with | PATTERNi -> OUTPUTi`
    Match {
        /// Number of arms
        arms: usize,
    },
    /// A variable occurrence
    VarGet,
    /// `let VAR ARG0.. = EXP1 in EXP2`
    Let {
        /// Number of function arguments
        args: usize,
    },
    /// Recursive let, not supported
    LetRec,
}

impl NodeKind {
    /// Names of the inputs this kind of node exposes, in display order.
    pub fn inputs(&self) -> Vec<String> {
        let fixed: &[&str] = match self {
            NodeKind::Compare(_) | NodeKind::IntArith(_) | NodeKind::FloatArith(_) => &["A", "B"],
            NodeKind::Ternary => &["IF", "THEN", "ELSE"],
            NodeKind::Pair => &["FIRST", "SECOND"],
            NodeKind::Fst => &["FIRST"],
            NodeKind::Snd => &["SECOND"],
            NodeKind::Lambda => &["RETURN"],
            NodeKind::App => &["FUN", "ARG"],
            NodeKind::Let { .. } | NodeKind::LetRec => &["EXP1", "EXP2"],
            NodeKind::List { items } => {
                return (0..*items).map(|i| format!("ADD{}", i)).collect();
            }
            NodeKind::Match { arms } => {
                return std::iter::once("INPUT".to_string())
                    .chain((1..=*arms).map(|i| format!("OUTPUT{}", i)))
                    .collect();
            }
            NodeKind::Bool(_) | NodeKind::Int(_) | NodeKind::Float(_) | NodeKind::VarGet => &[],
        };
        fixed.iter().map(|s| s.to_string()).collect()
    }

    /// Short name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Bool(_) => "bool",
            NodeKind::Int(_) => "int",
            NodeKind::Float(_) => "float",
            NodeKind::Compare(_) => "compare",
            NodeKind::Ternary => "ternary",
            NodeKind::IntArith(_) => "int arithmetic",
            NodeKind::FloatArith(_) => "float arithmetic",
            NodeKind::List { .. } => "list",
            NodeKind::Pair => "pair",
            NodeKind::Fst => "fst",
            NodeKind::Snd => "snd",
            NodeKind::Lambda => "lambda",
            NodeKind::App => "application",
            NodeKind::Match { .. } => "match",
            NodeKind::VarGet => "variable",
            NodeKind::Let { .. } => "let",
            NodeKind::LetRec => "letrec",
        }
    }
}
