//! Syntax tree produced by the parser and walked by the interpreter.

use std::fmt;
use std::rc::Rc;

/// A parsed script: the top-level statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// Function declaration or expression. Shared by every closure created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub body: Vec<Stmt>,
}

/// `var a = 1, b;`
pub type VarDeclarations = Vec<(Rc<str>, Option<Expr>)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var(VarDeclarations),
    FunctionDecl(Rc<FunctionDef>),
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: Expr,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        target: ForInTarget,
        object: Expr,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Return(Option<Expr>),
    Throw(Expr),
    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Var(VarDeclarations),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInTarget {
    Var(Rc<str>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Rc<str>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    InstanceOf,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Assignment operator; `None` is plain `=`, otherwise the compound operator.
pub type AssignOp = Option<BinaryOp>;

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKey {
    Static(Rc<str>),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    String(Rc<str>),
    Boolean(bool),
    Null,
    This,
    Identifier(Rc<str>),
    Regex {
        pattern: Rc<str>,
        flags: Rc<str>,
    },
    Array(Vec<Option<Expr>>),
    Object(Vec<(Rc<str>, Expr)>),
    Function(Rc<FunctionDef>),
    Unary {
        op: UnaryOp,
        argument: Box<Expr>,
    },
    Update {
        increment: bool,
        prefix: bool,
        argument: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: MemberKey,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    New {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Sequence(Vec<Expr>),
}

impl Expr {
    /// Renders reference-like expressions (`foo.bar.foobar`, `a[0]`) the way they
    /// appear in source, for use in error messages. Other expressions render as
    /// `expression`.
    pub fn describe(&self) -> String {
        match self {
            Expr::Identifier(name) => name.to_string(),
            Expr::This => "this".to_string(),
            Expr::Member { object, property } => match property {
                MemberKey::Static(name) => format!("{}.{}", object.describe(), name),
                MemberKey::Computed(key) => match key.as_ref() {
                    Expr::String(s) => format!("{}[\"{}\"]", object.describe(), s),
                    Expr::Number(n) => format!("{}[{}]", object.describe(), n),
                    other => format!("{}[{}]", object.describe(), other.describe()),
                },
            },
            Expr::Call { callee, .. } => format!("{}(...)", callee.describe()),
            _ => "expression".to_string(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
