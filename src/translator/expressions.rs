//! WHERE-clause lowering: recursive descent over the expression tree,
//! one arm per node variant. Specialty recognizers win over the generic
//! comparison forms.

use super::matchers::{self, ObjectIdFilter};
use super::values::{coerce_value, field_name, value_text};
use super::{Error, Result, Translator};
use crate::ast::{CompareOp, Expression, Function, Literal, LogicalOp};
use bson::{doc, Bson, Document};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LIKE_RANGE: Regex = Regex::new(r"(\[.+?\])").expect("static pattern");
}

impl Translator<'_> {
    pub(crate) fn lower_filter(&self, expr: &Expression) -> Result<Document> {
        match expr {
            Expression::Comparison { op, left, right } => {
                if let Some(m) = matchers::regex_match(expr)? {
                    return Ok(regex_document(m));
                }
                if let Some(m) = matchers::date_function(expr)? {
                    return Ok(doc! { m.column: { m.operator: m.date } });
                }
                if let Some(m) = matchers::object_id_match(expr)? {
                    return Ok(object_id_document(m));
                }
                if let Some(m) = matchers::bindata_match(expr)? {
                    return Ok(doc! { m.column: { "$eq": Bson::Binary(m.binary) } });
                }
                if let Some(m) = matchers::date_literal(expr)? {
                    return Ok(doc! { m.column: { m.operator: m.date } });
                }
                self.lower_comparison(*op, left, right)
            }
            Expression::Like {
                expr: left,
                pattern,
                negated,
            } => {
                if *negated {
                    return Err(Error::UnsupportedLike);
                }
                let regex = format!("^{}$", like_to_regex(&value_text(pattern)));
                Regex::new(&regex).map_err(|e| Error::Regex(e.to_string()))?;
                Ok(doc! { field_name(left)?: { "$regex": regex } })
            }
            Expression::IsNull {
                expr: inner,
                negated,
            } => Ok(doc! { field_name(inner)?: { "$exists": *negated } }),
            Expression::InList {
                expr: left,
                list,
                negated,
            } => {
                if let Some(m) = matchers::object_id_match(expr)? {
                    return Ok(object_id_document(m));
                }
                let values = list
                    .iter()
                    .map(|item| coerce_value(item, Some(left.as_ref()), self.options()))
                    .collect::<Result<Vec<_>>>()?;
                if let Expression::Function(function) = left.as_ref() {
                    let key = if *negated { "$fnin" } else { "$fin" };
                    Ok(doc! {
                        key: { "function": self.lower_function_call(function)?, "list": values }
                    })
                } else {
                    let key = if *negated { "$nin" } else { "$in" };
                    Ok(doc! { field_name(left)?: { key: values } })
                }
            }
            Expression::Logical { op, left, right } => self.lower_logical(*op, left, right),
            Expression::Nested { inner, negated } => {
                let lowered = self.lower_filter(inner)?;
                if *negated {
                    Ok(doc! { "$nor": [lowered] })
                } else {
                    Ok(lowered)
                }
            }
            Expression::Not(inner) => match inner.as_ref() {
                Expression::Column(_) | Expression::Literal(Literal::String(_)) => {
                    Ok(doc! { field_name(inner)?: { "$ne": true } })
                }
                _ => Ok(doc! { "$nor": [self.lower_filter(inner)?] }),
            },
            Expression::Function(function) => {
                if let Some(m) = matchers::regex_match(expr)? {
                    return Ok(regex_document(m));
                }
                self.lower_function_call(function)
            }
            Expression::Column(_) | Expression::Literal(Literal::String(_)) => {
                Ok(doc! { field_name(expr)?: true })
            }
            other => Err(Error::UnsupportedExpression(other.to_string())),
        }
    }

    fn lower_comparison(
        &self,
        op: CompareOp,
        left: &Expression,
        right: &Expression,
    ) -> Result<Document> {
        match op {
            CompareOp::Eq => {
                let left_function = matches!(left, Expression::Function(_));
                let right_function = matches!(right, Expression::Function(_));
                if left_function || right_function {
                    let (function_expr, other) = if left_function {
                        (left, right)
                    } else {
                        (right, left)
                    };
                    let function = match function_expr {
                        Expression::Function(f) => f,
                        _ => return Err(Error::UnsupportedExpression(function_expr.to_string())),
                    };
                    // the field-type lookup keys on the call's printed
                    // form, which is never mapped, so the default applies
                    let rhs = match other {
                        Expression::Column(column) => {
                            Bson::String(format!("${}", column.name()))
                        }
                        _ => coerce_value(other, Some(function_expr), self.options())?,
                    };
                    Ok(doc! {
                        "$expr": { "$eq": [self.lower_function_call(function)?, rhs] }
                    })
                } else if let (Expression::Column(l), Expression::Column(r)) = (left, right) {
                    Ok(doc! { "$expr": { "$eq": [l.name(), r.name()] } })
                } else {
                    Ok(doc! {
                        field_name(left)?: coerce_value(right, Some(left), self.options())?
                    })
                }
            }
            CompareOp::NotEq => Ok(doc! {
                field_name(left)?: { "$ne": coerce_value(right, Some(left), self.options())? }
            }),
            CompareOp::Gt | CompareOp::GtEq | CompareOp::Lt | CompareOp::LtEq => {
                let operator = match op {
                    CompareOp::Gt => "$gt",
                    CompareOp::GtEq => "$gte",
                    CompareOp::Lt => "$lt",
                    _ => "$lte",
                };
                Ok(doc! {
                    field_name(left)?: {
                        operator: coerce_value(right, Some(left), self.options())?
                    }
                })
            }
        }
    }

    // A AND B AND C lowers to one flat list: same-kind left children are
    // collected; a different-kind left child stays a single element.
    fn lower_logical(
        &self,
        op: LogicalOp,
        left: &Expression,
        right: &Expression,
    ) -> Result<Document> {
        let key = match op {
            LogicalOp::And => "$and",
            LogicalOp::Or => "$or",
        };
        let mut operands = Vec::new();
        self.collect_operands(op, left, &mut operands)?;
        operands.push(self.lower_filter(right)?);
        Ok(doc! { key: operands })
    }

    fn collect_operands(
        &self,
        op: LogicalOp,
        expr: &Expression,
        out: &mut Vec<Document>,
    ) -> Result<()> {
        match expr {
            Expression::Logical {
                op: inner,
                left,
                right,
            } if *inner == op => {
                self.collect_operands(op, left, out)?;
                out.push(self.lower_filter(right)?);
                Ok(())
            }
            _ => {
                out.push(self.lower_filter(expr)?);
                Ok(())
            }
        }
    }

    /// A free-standing function call becomes `{$name: args}`: one
    /// argument is embedded directly, none becomes null, several become
    /// a list. Nested calls recurse.
    pub(crate) fn lower_function_call(&self, function: &Function) -> Result<Document> {
        let mut args = function
            .args
            .iter()
            .map(|arg| self.function_argument(arg))
            .collect::<Result<Vec<_>>>()?;
        let value = match args.len() {
            0 => Bson::Null,
            1 => args.remove(0),
            _ => Bson::Array(args),
        };
        Ok(doc! { format!("${}", function.name): value })
    }

    fn function_argument(&self, arg: &Expression) -> Result<Bson> {
        match arg {
            Expression::Function(inner) => Ok(Bson::Document(self.lower_function_call(inner)?)),
            _ => coerce_value(arg, None, self.options()),
        }
    }
}

fn regex_document(m: matchers::RegexMatch) -> Document {
    let mut regex = doc! { "$regex": m.regex };
    if let Some(options) = m.options {
        regex.insert("$options", options);
    }
    doc! { m.column: regex }
}

fn object_id_document(m: matchers::ObjectIdMatch) -> Document {
    match m.filter {
        ObjectIdFilter::Eq(id) => doc! { m.column: id },
        ObjectIdFilter::Ne(id) => doc! { m.column: { "$ne": id } },
        ObjectIdFilter::In(ids) => doc! { m.column: { "$in": ids } },
        ObjectIdFilter::Nin(ids) => doc! { m.column: { "$nin": ids } },
    }
}

/// Translate SQL LIKE wildcards into regex syntax: `%` becomes any run,
/// `_` exactly one character, and `[...]` classes match one character.
fn like_to_regex(pattern: &str) -> String {
    let replaced = pattern.replace('%', ".*").replace('_', ".{1}");
    LIKE_RANGE.replace_all(&replaced, "${1}{1}").into_owned()
}
