//! Expression tree.

use std::sync::Arc;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `~`
    BitNot,
    /// `typeof`
    TypeOf,
    /// `void`
    Void,
}

/// Binary operators that always evaluate both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `**`
    Pow,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNe,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Nullish,
}

/// Object literal member.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// `key: value`, `"key": value` or shorthand `key`.
    Named(String, Expr),
    /// `[key]: value`
    Computed(Expr, Expr),
    /// `...value`
    Spread(Expr),
}

/// Array literal or argument list element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A single value.
    Item(Expr),
    /// `...value`
    Spread(Expr),
}

/// Arrow function parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// `x`
    Name(String),
    /// `{ a, b: c }`: pairs of property and local name.
    Object(Vec<(String, String)>),
}

/// An arrow function.
#[derive(Debug, PartialEq)]
pub struct ArrowFunction {
    /// Parameters in order.
    pub params: Vec<Param>,
    /// Returned expression; `None` for an empty block body.
    pub body: Option<Expr>,
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    String(String),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
    /// `undefined` and `this`
    Undefined,
    /// `/source/flags`
    Regex {
        /// Pattern.
        source: String,
        /// Flags.
        flags: String,
    },
    /// Variable reference.
    Ident(String),
    /// `[a, b, ...c]`
    Array(Vec<Element>),
    /// `{a: 1, ...b}`
    Object(Vec<Property>),
    /// `object.name`, `object[expr]` or `object?.name`.
    Member {
        /// Object expression.
        object: Box<Expr>,
        /// Property expression; names are string literals.
        property: Box<Expr>,
        /// `?.` link.
        optional: bool,
    },
    /// `callee(args)` or `callee?.(args)`.
    Call {
        /// Callee expression.
        callee: Box<Expr>,
        /// Arguments.
        args: Vec<Element>,
        /// `?.` link.
        optional: bool,
    },
    /// Boundary of a chain containing `?.` links.
    Chain(Box<Expr>),
    /// Prefix operator.
    Unary(UnaryOp, Box<Expr>),
    /// Binary operator.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Short-circuiting operator.
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    /// `test ? then : otherwise`
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `a, b`
    Sequence(Vec<Expr>),
    /// Arrow function.
    Arrow(Arc<ArrowFunction>),
}

impl Expr {
    /// Source-like text for error messages (`z.foo`, `schema.min`).
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Member {
                object, property, ..
            } => match property.as_ref() {
                Self::String(name) => format!("{}.{}", object.describe(), name),
                _ => format!("{}[...]", object.describe()),
            },
            Self::Call { callee, .. } => format!("{}(...)", callee.describe()),
            Self::Chain(inner) => inner.describe(),
            Self::Number(n) => zt_schema::value::js_number_string(*n),
            Self::String(s) => format!("\"{s}\""),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
            Self::Undefined => "undefined".to_string(),
            _ => "(intermediate value)".to_string(),
        }
    }
}
