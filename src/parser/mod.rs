//! Front end over `sqlparser`.
//!
//! Parses the incoming SQL text with the generic dialect and converts the
//! resulting tree into the crate's own [`ast`](crate::ast). Structural
//! restrictions that do not need the field-type map are enforced here:
//! one simple table name per FROM, no sub-selects, no double equals.

use crate::ast::{
    Column, CompareOp, DeleteStatement, Expression, Function, Join, JoinKind, Literal, LogicalOp,
    OrderByItem, SelectItem, SelectStatement, Statement,
};
use sqlparser::ast as sql;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unable to parse complete sql string. one reason for this is the use of double equals (==).")]
    DoubleEquals,
    #[error("Only one simple table name is supported.")]
    DerivedTable,
    #[error("Join type not suported")]
    UnsupportedJoin,
    #[error("Unsupported subselect expression")]
    SubSelect,
    #[error("Only select statements are supported.")]
    UnsupportedStatement,
    #[error("expected exactly one SQL statement")]
    MultipleStatements,
    #[error("queries must select from exactly one collection")]
    MissingFrom,
    #[error("{0}: value is too large")]
    ValueTooLarge(String),
    #[error("unsupported SQL expression: {0}")]
    UnsupportedExpression(String),
    #[error("{0}")]
    Syntax(String),
}

/// Parse a single SELECT or DELETE statement into the crate AST.
pub fn parse_statement(sql_text: &str) -> Result<Statement> {
    reject_double_equals(sql_text)?;
    let mut statements = Parser::parse_sql(&GenericDialect {}, sql_text)
        .map_err(|e| Error::Syntax(e.to_string()))?;
    if statements.len() != 1 {
        return Err(Error::MultipleStatements);
    }
    match statements.remove(0) {
        sql::Statement::Query(query) => convert_query(*query),
        sql::Statement::Delete(delete) => convert_delete(delete),
        _ => Err(Error::UnsupportedStatement),
    }
}

// `a == b` must fail with the dedicated message before the text reaches
// the parser. Quoted regions are skipped.
fn reject_double_equals(sql_text: &str) -> Result<()> {
    let mut quote: Option<char> = None;
    let mut previous = '\0';
    for ch in sql_text.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '=' if previous == '=' => return Err(Error::DoubleEquals),
                _ => {}
            },
        }
        previous = ch;
    }
    Ok(())
}

fn convert_query(query: sql::Query) -> Result<Statement> {
    if query.with.is_some() {
        return Err(Error::UnsupportedExpression("WITH".to_string()));
    }
    let select = match *query.body {
        sql::SetExpr::Select(select) => *select,
        other => return Err(Error::UnsupportedExpression(other.to_string())),
    };
    if select.having.is_some() {
        return Err(Error::UnsupportedExpression("HAVING".to_string()));
    }

    if select.from.is_empty() {
        return Err(Error::MissingFrom);
    }
    if select.from.len() > 1 {
        // comma-separated FROM lists are old-style joins
        return Err(Error::UnsupportedJoin);
    }
    let table = &select.from[0];
    let (collection, table_alias) = convert_relation(&table.relation)?;
    let joins = table
        .joins
        .iter()
        .map(convert_join)
        .collect::<Result<Vec<_>>>()?;

    let distinct = match &select.distinct {
        None => false,
        Some(sql::Distinct::Distinct) => true,
        Some(sql::Distinct::On(_)) => {
            return Err(Error::UnsupportedExpression("DISTINCT ON".to_string()))
        }
    };

    let items = select
        .projection
        .iter()
        .map(convert_select_item)
        .collect::<Result<Vec<_>>>()?;

    let filter = select.selection.as_ref().map(convert_expr).transpose()?;

    let group_by = match &select.group_by {
        sql::GroupByExpr::Expressions(exprs, _) => exprs
            .iter()
            .map(|e| match convert_expr(e)? {
                Expression::Column(c) => Ok(c),
                other => Err(Error::UnsupportedExpression(other.to_string())),
            })
            .collect::<Result<Vec<_>>>()?,
        sql::GroupByExpr::All(_) => {
            return Err(Error::UnsupportedExpression("GROUP BY ALL".to_string()))
        }
    };

    let order_by = match &query.order_by {
        None => Vec::new(),
        Some(order_by) => {
            if order_by.interpolate.is_some() {
                return Err(Error::UnsupportedExpression("INTERPOLATE".to_string()));
            }
            order_by
                .exprs
                .iter()
                .map(|o| {
                    Ok(OrderByItem {
                        expr: convert_expr(&o.expr)?,
                        ascending: o.asc.unwrap_or(true),
                    })
                })
                .collect::<Result<Vec<_>>>()?
        }
    };

    let limit = query.limit.as_ref().map(parse_bounded_int).transpose()?;
    let offset = query
        .offset
        .as_ref()
        .map(|o| parse_bounded_int(&o.value))
        .transpose()?;

    Ok(Statement::Select(SelectStatement {
        items,
        collection,
        table_alias,
        filter,
        group_by,
        order_by,
        offset,
        limit,
        distinct,
        joins,
    }))
}

fn convert_delete(delete: sql::Delete) -> Result<Statement> {
    let tables = match &delete.from {
        sql::FromTable::WithFromKeyword(tables) | sql::FromTable::WithoutKeyword(tables) => tables,
    };
    if tables.is_empty() {
        return Err(Error::MissingFrom);
    }
    if tables.len() > 1 || !tables[0].joins.is_empty() {
        return Err(Error::UnsupportedJoin);
    }
    let (collection, _) = convert_relation(&tables[0].relation)?;
    let filter = delete.selection.as_ref().map(convert_expr).transpose()?;
    Ok(Statement::Delete(DeleteStatement { collection, filter }))
}

fn convert_relation(relation: &sql::TableFactor) -> Result<(String, Option<String>)> {
    match relation {
        sql::TableFactor::Table { name, alias, .. } => Ok((
            name.to_string(),
            alias.as_ref().map(|a| a.name.value.clone()),
        )),
        _ => Err(Error::DerivedTable),
    }
}

fn convert_join(join: &sql::Join) -> Result<Join> {
    let (collection, alias) = convert_relation(&join.relation)?;
    let (kind, constraint) = match &join.join_operator {
        sql::JoinOperator::Inner(c) => (JoinKind::Inner, c),
        sql::JoinOperator::LeftOuter(c) => (JoinKind::Left, c),
        sql::JoinOperator::RightOuter(c) => (JoinKind::Right, c),
        _ => return Err(Error::UnsupportedJoin),
    };
    let on = match constraint {
        sql::JoinConstraint::On(expr) => Some(convert_expr(expr)?),
        sql::JoinConstraint::None => None,
        _ => return Err(Error::UnsupportedJoin),
    };
    Ok(Join {
        collection,
        alias,
        kind,
        on,
    })
}

fn convert_select_item(item: &sql::SelectItem) -> Result<SelectItem> {
    match item {
        sql::SelectItem::Wildcard(_) => Ok(SelectItem::AllColumns),
        sql::SelectItem::UnnamedExpr(expr) => Ok(SelectItem::Expr {
            expr: convert_expr(expr)?,
            alias: None,
        }),
        sql::SelectItem::ExprWithAlias { expr, alias } => Ok(SelectItem::Expr {
            expr: convert_expr(expr)?,
            alias: Some(alias.value.clone()),
        }),
        sql::SelectItem::QualifiedWildcard(..) => Err(Error::UnsupportedExpression(
            "qualified wildcard".to_string(),
        )),
    }
}

fn convert_expr(expr: &sql::Expr) -> Result<Expression> {
    match expr {
        sql::Expr::Identifier(ident) => Ok(ident_expr(ident)),
        sql::Expr::CompoundIdentifier(idents) => Ok(Expression::Column(Column::new(
            idents.iter().map(|i| i.value.clone()).collect(),
        ))),
        sql::Expr::Value(value) => convert_value(value),
        sql::Expr::UnaryOp {
            op: sql::UnaryOperator::Minus,
            expr,
        } => match convert_expr(expr)? {
            Expression::Literal(Literal::Long(n)) => Ok(Expression::Literal(Literal::Long(-n))),
            Expression::Literal(Literal::Double(d)) => {
                Ok(Expression::Literal(Literal::Double(-d)))
            }
            other => Err(Error::UnsupportedExpression(format!("-{other}"))),
        },
        sql::Expr::UnaryOp {
            op: sql::UnaryOperator::Plus,
            expr,
        } => convert_expr(expr),
        sql::Expr::UnaryOp {
            op: sql::UnaryOperator::Not,
            expr,
        } => match convert_expr(expr)? {
            Expression::Nested { inner, .. } => Ok(Expression::Nested {
                inner,
                negated: true,
            }),
            inner => Ok(Expression::Not(Box::new(inner))),
        },
        sql::Expr::UnaryOp { op, .. } => Err(Error::UnsupportedExpression(op.to_string())),
        sql::Expr::BinaryOp { left, op, right } => convert_binary_op(left, op, right),
        sql::Expr::Nested(inner) => Ok(Expression::Nested {
            inner: Box::new(convert_expr(inner)?),
            negated: false,
        }),
        sql::Expr::IsNull(inner) => Ok(Expression::IsNull {
            expr: Box::new(convert_expr(inner)?),
            negated: false,
        }),
        sql::Expr::IsNotNull(inner) => Ok(Expression::IsNull {
            expr: Box::new(convert_expr(inner)?),
            negated: true,
        }),
        sql::Expr::InList {
            expr,
            list,
            negated,
        } => Ok(Expression::InList {
            expr: Box::new(convert_expr(expr)?),
            list: list.iter().map(convert_expr).collect::<Result<Vec<_>>>()?,
            negated: *negated,
        }),
        sql::Expr::Like {
            negated,
            expr,
            pattern,
            ..
        } => Ok(Expression::Like {
            expr: Box::new(convert_expr(expr)?),
            pattern: Box::new(convert_expr(pattern)?),
            negated: *negated,
        }),
        sql::Expr::Case {
            operand: None,
            conditions,
            results,
            else_result,
        } => {
            let branches = conditions
                .iter()
                .zip(results.iter())
                .map(|(when, then)| Ok((convert_expr(when)?, convert_expr(then)?)))
                .collect::<Result<Vec<_>>>()?;
            let else_result = else_result
                .as_ref()
                .map(|e| convert_expr(e))
                .transpose()?
                .map(Box::new);
            Ok(Expression::Case {
                branches,
                else_result,
            })
        }
        sql::Expr::Case { .. } => Err(Error::UnsupportedExpression(
            "CASE <expr> WHEN ...".to_string(),
        )),
        sql::Expr::Function(function) => convert_function(function),
        sql::Expr::Wildcard => Ok(Expression::Wildcard),
        sql::Expr::Subquery(_) | sql::Expr::InSubquery { .. } | sql::Expr::Exists { .. } => {
            Err(Error::SubSelect)
        }
        other => Err(Error::UnsupportedExpression(other.to_string())),
    }
}

fn convert_binary_op(
    left: &sql::Expr,
    op: &sql::BinaryOperator,
    right: &sql::Expr,
) -> Result<Expression> {
    let left = Box::new(convert_expr(left)?);
    let right = Box::new(convert_expr(right)?);
    let op = match op {
        sql::BinaryOperator::And => {
            return Ok(Expression::Logical {
                op: LogicalOp::And,
                left,
                right,
            })
        }
        sql::BinaryOperator::Or => {
            return Ok(Expression::Logical {
                op: LogicalOp::Or,
                left,
                right,
            })
        }
        sql::BinaryOperator::Minus => return Ok(Expression::Subtract { left, right }),
        sql::BinaryOperator::Eq => CompareOp::Eq,
        sql::BinaryOperator::NotEq => CompareOp::NotEq,
        sql::BinaryOperator::Gt => CompareOp::Gt,
        sql::BinaryOperator::Lt => CompareOp::Lt,
        sql::BinaryOperator::GtEq => CompareOp::GtEq,
        sql::BinaryOperator::LtEq => CompareOp::LtEq,
        other => return Err(Error::UnsupportedExpression(other.to_string())),
    };
    Ok(Expression::Comparison { op, left, right })
}

fn convert_function(function: &sql::Function) -> Result<Expression> {
    let name = function.name.to_string();
    let args = match &function.args {
        sql::FunctionArguments::None => Vec::new(),
        sql::FunctionArguments::Subquery(_) => return Err(Error::SubSelect),
        sql::FunctionArguments::List(list) => list
            .args
            .iter()
            .map(|arg| match arg {
                sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Expr(e)) => convert_expr(e),
                sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Wildcard) => {
                    Ok(Expression::Wildcard)
                }
                other => Err(Error::UnsupportedExpression(other.to_string())),
            })
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(Expression::Function(Function { name, args }))
}

// Double-quoted tokens come through the generic dialect as quoted
// identifiers; the original grammar reads them as string values.
fn ident_expr(ident: &sql::Ident) -> Expression {
    if ident.quote_style == Some('"') {
        Expression::Literal(Literal::String(ident.value.clone()))
    } else {
        Expression::Column(Column::new(vec![ident.value.clone()]))
    }
}

fn convert_value(value: &sql::Value) -> Result<Expression> {
    match value {
        sql::Value::Number(text, _) => {
            if let Ok(n) = text.parse::<i64>() {
                Ok(Expression::Literal(Literal::Long(n)))
            } else if let Ok(d) = text.parse::<f64>() {
                Ok(Expression::Literal(Literal::Double(d)))
            } else {
                Err(Error::Syntax(format!("invalid numeric literal: {text}")))
            }
        }
        sql::Value::SingleQuotedString(s) | sql::Value::DoubleQuotedString(s) => {
            Ok(Expression::Literal(Literal::String(s.clone())))
        }
        sql::Value::Boolean(b) => Ok(Expression::Literal(Literal::Boolean(*b))),
        other => Err(Error::UnsupportedExpression(other.to_string())),
    }
}

// LIMIT and OFFSET must fit in 32 bits even though the plan carries i64.
fn parse_bounded_int(expr: &sql::Expr) -> Result<i64> {
    let text = match expr {
        sql::Expr::Value(sql::Value::Number(text, _)) => text.clone(),
        other => return Err(Error::UnsupportedExpression(other.to_string())),
    };
    let value: i64 = text
        .parse()
        .map_err(|_| Error::ValueTooLarge(text.clone()))?;
    if value > i32::MAX as i64 {
        return Err(Error::ValueTooLarge(text));
    }
    Ok(value)
}
