//! Syntax tree for the form-script subset.
//!
//! Produced by [`crate::parser::parse_script`] and consumed by the model
//! builder. Every node carries a [`Range`] that starts at the *full start*
//! of its first token (leading whitespace and comments included) and ends
//! right after its last token, so that replacing or deleting a node's range
//! removes the line it sits on along with it.

use crate::model::Range;

/// A parsed source unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub file_name: String,
    pub statements: Vec<Stmt>,
    /// Span of the whole file: `0..text.len()`.
    pub range: Range,
}

// ─── Statements ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let a = 1, b = 2;`
    Variable(VariableList),
    /// `f.Show();`
    Expression(Expr),
    /// `if (cond) stmt else stmt`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `function name(...) { ... }`; body skipped by the parser.
    Function { name: Ident },
    Return(Option<Expr>),
    /// `while (...) body` / `for (...) body`; header skipped by the parser.
    Loop { keyword: LoopKeyword, body: Box<Stmt> },
    Break,
    Continue,
    /// A lone `;`.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKeyword {
    While,
    For,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Let,
    Const,
    Var,
}

/// The declaration list of a variable statement, keyword included.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableList {
    pub keyword: DeclKeyword,
    pub declarations: Vec<VariableDecl>,
    pub range: Range,
}

/// One `name = init` entry of a declaration list.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub target: BindingTarget,
    pub init: Option<Expr>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingTarget {
    Identifier(Ident),
    /// Destructuring pattern (`{ a, b }` / `[a, b]`), kept only as a span.
    Pattern(Range),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub range: Range,
}

// ─── Expressions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Bool(bool),
    /// Numeric literal, source text as written.
    Number(String),
    /// String literal, quotes removed and escapes decoded.
    String(String),
    Null,
    This,
    Identifier(String),
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: Ident,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Object(Vec<Property>),
    Array(Vec<Expr>),
    /// Binary and assignment operators share one node, as assignment is
    /// just the lowest-precedence binary operator.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// `function (...) { ... }`; body skipped by the parser.
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Or,
    And,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    TypeOf,
    Increment,
    Decrement,
}

// ─── Object literal members ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub kind: PropertyKind,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// `name: value`
    Assignment { name: PropertyName, value: Expr },
    /// `{ name }`
    Shorthand(Ident),
    /// `name() { ... }`; body skipped by the parser.
    Method(PropertyName),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyName {
    Identifier(Ident),
    String(String),
    Number(String),
}

impl Expr {
    /// Short human-readable label for diagnostics.
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            ExprKind::Bool(_) => "boolean literal",
            ExprKind::Number(_) => "numeric literal",
            ExprKind::String(_) => "string literal",
            ExprKind::Null => "null literal",
            ExprKind::This => "`this` expression",
            ExprKind::Identifier(_) => "identifier",
            ExprKind::Member { .. } => "property access",
            ExprKind::Index { .. } => "element access",
            ExprKind::Call { .. } => "call expression",
            ExprKind::New { .. } => "`new` expression",
            ExprKind::Object(_) => "object literal",
            ExprKind::Array(_) => "array literal",
            ExprKind::Binary { .. } => "binary expression",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Conditional { .. } => "conditional expression",
            ExprKind::Paren(_) => "parenthesized expression",
            ExprKind::Function => "function expression",
        }
    }
}

impl Stmt {
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            StmtKind::Variable(_) => "variable statement",
            StmtKind::Expression(_) => "expression statement",
            StmtKind::If { .. } => "if statement",
            StmtKind::Block(_) => "block",
            StmtKind::Function { .. } => "function declaration",
            StmtKind::Return(_) => "return statement",
            StmtKind::Loop {
                keyword: LoopKeyword::While,
                ..
            } => "while statement",
            StmtKind::Loop {
                keyword: LoopKeyword::For,
                ..
            } => "for statement",
            StmtKind::Break => "break statement",
            StmtKind::Continue => "continue statement",
            StmtKind::Empty => "empty statement",
        }
    }
}
