//! The parsed-statement tree consumed by the translator.
//!
//! The parser front end converts `sqlparser`'s syntax tree into these
//! crate-owned nodes so the lowering code never depends on the external
//! parser's representation. The tree is immutable once built; the
//! translator rewrites it only to erase the base table alias.

use std::fmt;

/// A literal value appearing in a query. Signs are folded into the
/// numeric variants by the parser, and double-quoted identifiers arrive
/// here as `String` values the way single-quoted text does.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Long(i64),
    Double(f64),
    String(String),
    Boolean(bool),
}

/// A (possibly dotted) column reference. The first segment may be the
/// base table's alias until the translator erases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub parts: Vec<String>,
}

impl Column {
    pub fn new(parts: Vec<String>) -> Self {
        Column { parts }
    }

    /// The dotted name, e.g. `a.b.c`.
    pub fn name(&self) -> String {
        self.parts.join(".")
    }
}

/// A function call, `name(arg, ...)`. Aggregates, specialty functions
/// and passthrough functions all share this node; the translator decides
/// which is which.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Column(Column),
    Function(Function),
    /// The `*` inside `COUNT(*)`.
    Wildcard,
    Comparison {
        op: CompareOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Like {
        expr: Box<Expression>,
        pattern: Box<Expression>,
        negated: bool,
    },
    InList {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    },
    /// `IS NULL` when `negated` is false, `IS NOT NULL` when true.
    IsNull {
        expr: Box<Expression>,
        negated: bool,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not(Box<Expression>),
    /// A parenthesized sub-expression; `negated` carries a preceding NOT.
    Nested {
        inner: Box<Expression>,
        negated: bool,
    },
    Case {
        branches: Vec<(Expression, Expression)>,
        else_result: Option<Box<Expression>>,
    },
    Subtract {
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

/// One item of the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    AllColumns,
    Expr {
        expr: Expression,
        alias: Option<String>,
    },
}

impl SelectItem {
    pub fn alias(&self) -> Option<&str> {
        match self {
            SelectItem::Expr { alias, .. } => alias.as_deref(),
            SelectItem::AllColumns => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expression,
    pub ascending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

/// An explicit JOIN clause. The core recognizes these but hands them to
/// an external [`JoinPlanner`](crate::JoinPlanner) to build the lookup
/// pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub collection: String,
    pub alias: Option<String>,
    pub kind: JoinKind,
    pub on: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub items: Vec<SelectItem>,
    pub collection: String,
    pub table_alias: Option<String>,
    pub filter: Option<Expression>,
    pub group_by: Vec<Column>,
    pub order_by: Vec<OrderByItem>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub distinct: bool,
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub collection: String,
    pub filter: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Delete(DeleteStatement),
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Long(n) => write!(f, "{n}"),
            Literal::Double(d) => write!(f, "{d}"),
            Literal::String(s) => write!(f, "'{s}'"),
            Literal::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::GtEq => ">=",
            CompareOp::LtEq => "<=",
        };
        write!(f, "{op}")
    }
}

// Used only for error messages, so the rendering stays approximate SQL.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(l) => write!(f, "{l}"),
            Expression::Column(c) => write!(f, "{c}"),
            Expression::Wildcard => write!(f, "*"),
            Expression::Function(func) => {
                write!(f, "{}(", func.name)?;
                for (i, arg) in func.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expression::Comparison { op, left, right } => write!(f, "{left} {op} {right}"),
            Expression::Like {
                expr,
                pattern,
                negated,
            } => write!(
                f,
                "{expr} {}LIKE {pattern}",
                if *negated { "NOT " } else { "" }
            ),
            Expression::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{expr} {}IN (", if *negated { "NOT " } else { "" })?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Expression::IsNull { expr, negated } => {
                write!(f, "{expr} IS {}NULL", if *negated { "NOT " } else { "" })
            }
            Expression::Logical { op, left, right } => {
                let op = match op {
                    LogicalOp::And => "AND",
                    LogicalOp::Or => "OR",
                };
                write!(f, "{left} {op} {right}")
            }
            Expression::Not(inner) => write!(f, "NOT {inner}"),
            Expression::Nested { inner, negated } => {
                write!(f, "{}({inner})", if *negated { "NOT " } else { "" })
            }
            Expression::Case {
                branches,
                else_result,
            } => {
                write!(f, "CASE")?;
                for (when, then) in branches {
                    write!(f, " WHEN {when} THEN {then}")?;
                }
                if let Some(e) = else_result {
                    write!(f, " ELSE {e}")?;
                }
                write!(f, " END")
            }
            Expression::Subtract { left, right } => write!(f, "{left} - {right}"),
        }
    }
}
