//! Pattern recognizers for the specialty WHERE-clause functions.
//!
//! Each recognizer inspects an expression and returns a structured match
//! when it fits one of the known shapes (`regexMatch`, `date`,
//! `OBJECTID`, `Bindata`), so the filter lowering can emit the
//! MongoDB-native form instead of a generic comparison. A shape that
//! almost matches (wrong arity, wrong argument type) is simply "no
//! match" and falls through to the generic lowering.

use super::values::{self, value_text};
use super::{Error, Result};
use crate::ast::{CompareOp, Expression, Function, Literal};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::Binary;

pub(crate) struct RegexMatch {
    pub column: String,
    pub regex: String,
    pub options: Option<String>,
}

pub(crate) struct DateComparison {
    pub column: String,
    pub operator: &'static str,
    pub date: bson::DateTime,
}

pub(crate) enum ObjectIdFilter {
    Eq(ObjectId),
    Ne(ObjectId),
    In(Vec<ObjectId>),
    Nin(Vec<ObjectId>),
}

pub(crate) struct ObjectIdMatch {
    pub column: String,
    pub filter: ObjectIdFilter,
}

pub(crate) struct BindataMatch {
    pub column: String,
    pub binary: Binary,
}

/// `regexMatch(col, 'pat' [, 'opts']) = true`, or the bare call in a
/// boolean position. `= false` is rejected outright.
pub(crate) fn regex_match(expr: &Expression) -> Result<Option<RegexMatch>> {
    match expr {
        Expression::Comparison {
            op: CompareOp::Eq,
            left,
            right,
        } => {
            let function = match left.as_ref() {
                Expression::Function(f) if is_function(f, "regexMatch") => f,
                _ => return Ok(None),
            };
            if regex_arguments(function).is_none() {
                return Ok(None);
            }
            match right.as_ref() {
                Expression::Literal(Literal::Boolean(true)) => {}
                Expression::Literal(Literal::String(s)) if s.eq_ignore_ascii_case("true") => {}
                Expression::Literal(Literal::Boolean(false)) => {
                    return Err(Error::RegexMatchFalse)
                }
                _ => return Err(Error::RegexMatchFalse),
            }
            build_regex_match(function).map(Some)
        }
        Expression::Function(f) if is_function(f, "regexMatch") => {
            if regex_arguments(f).is_none() {
                return Ok(None);
            }
            build_regex_match(f).map(Some)
        }
        _ => Ok(None),
    }
}

fn regex_arguments(function: &Function) -> Option<(&Expression, &str)> {
    if !(2..=3).contains(&function.args.len()) {
        return None;
    }
    match &function.args[1] {
        Expression::Literal(Literal::String(pattern)) => Some((&function.args[0], pattern)),
        _ => None,
    }
}

fn build_regex_match(function: &Function) -> Result<RegexMatch> {
    let (column, pattern) = regex_arguments(function)
        .ok_or_else(|| Error::UnsupportedExpression(function.name.clone()))?;
    // compile now so a bad pattern fails the whole translation
    regex::Regex::new(pattern).map_err(|e| Error::Regex(e.to_string()))?;
    let options = match function.args.get(2) {
        Some(Expression::Literal(Literal::String(options))) => Some(options.clone()),
        _ => None,
    };
    Ok(RegexMatch {
        column: value_text(column),
        regex: pattern.to_string(),
        options,
    })
}

/// `date(col, 'fmt') OP 'literal'`. A format of `natural` selects the
/// natural-language parser; anything else falls back to the standard
/// date parsing chain.
pub(crate) fn date_function(expr: &Expression) -> Result<Option<DateComparison>> {
    let (op, left, right) = match expr {
        Expression::Comparison { op, left, right } => (op, left.as_ref(), right.as_ref()),
        _ => return Ok(None),
    };
    let operator = match comparison_operator(*op) {
        Some(operator) => operator,
        None => return Ok(None),
    };
    let function = match left {
        Expression::Function(f) if is_function(f, "date") => f,
        _ => return Ok(None),
    };
    if function.args.len() != 2 {
        return Ok(None);
    }
    let format = match &function.args[1] {
        Expression::Literal(Literal::String(format)) => format,
        _ => return Ok(None),
    };
    let column = value_text(&function.args[0]);
    let text = value_text(right);
    let date = if format == "natural" {
        values::natural_date(&text)?
    } else {
        values::parse_date(&text)?
    };
    Ok(Some(DateComparison {
        column,
        operator,
        date,
    }))
}

/// `col OP date('literal')`: a date literal on the right-hand side.
pub(crate) fn date_literal(expr: &Expression) -> Result<Option<DateComparison>> {
    let (op, left, right) = match expr {
        Expression::Comparison { op, left, right } => (op, left.as_ref(), right.as_ref()),
        _ => return Ok(None),
    };
    let operator = match comparison_operator(*op) {
        Some(operator) => operator,
        None => return Ok(None),
    };
    let function = match right {
        Expression::Function(f) if is_function(f, "date") => f,
        _ => return Ok(None),
    };
    let text = match &function.args[..] {
        [Expression::Literal(Literal::String(text))] => text,
        _ => return Ok(None),
    };
    Ok(Some(DateComparison {
        column: value_text(left),
        operator,
        date: values::parse_date(text)?,
    }))
}

/// `OBJECTID('col') OP 'hex24'` or `OBJECTID('col') [NOT] IN (...)`.
pub(crate) fn object_id_match(expr: &Expression) -> Result<Option<ObjectIdMatch>> {
    match expr {
        Expression::Comparison { op, left, right } => {
            let column = match object_id_column(left) {
                Some(column) => column,
                None => return Ok(None),
            };
            let id = parse_object_id(&value_text(right))?;
            let filter = match op {
                CompareOp::Eq => ObjectIdFilter::Eq(id),
                CompareOp::NotEq => ObjectIdFilter::Ne(id),
                _ => return Ok(None),
            };
            Ok(Some(ObjectIdMatch { column, filter }))
        }
        Expression::InList {
            expr,
            list,
            negated,
        } => {
            let column = match object_id_column(expr) {
                Some(column) => column,
                None => return Ok(None),
            };
            let ids = list
                .iter()
                .map(|item| parse_object_id(&value_text(item)))
                .collect::<Result<Vec<_>>>()?;
            let filter = if *negated {
                ObjectIdFilter::Nin(ids)
            } else {
                ObjectIdFilter::In(ids)
            };
            Ok(Some(ObjectIdMatch { column, filter }))
        }
        _ => Ok(None),
    }
}

fn object_id_column(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Function(f) if is_function(f, "objectid") => match &f.args[..] {
            [Expression::Literal(Literal::String(column))] => Some(column.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn parse_object_id(text: &str) -> Result<ObjectId> {
    ObjectId::parse_str(text).map_err(|_| Error::InvalidObjectId(text.to_string()))
}

/// `col = Bindata('<base64>')`: generic binary, subtype 03.
pub(crate) fn bindata_match(expr: &Expression) -> Result<Option<BindataMatch>> {
    let (left, right) = match expr {
        Expression::Comparison {
            op: CompareOp::Eq,
            left,
            right,
        } => (left.as_ref(), right.as_ref()),
        _ => return Ok(None),
    };
    let function = match right {
        Expression::Function(f) if is_function(f, "bindata") => f,
        _ => return Ok(None),
    };
    let payload = match function.args.first() {
        Some(Expression::Literal(Literal::String(payload))) => payload,
        _ => return Ok(None),
    };
    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| Error::InvalidBinary(payload.clone()))?;
    Ok(Some(BindataMatch {
        column: value_text(left),
        binary: Binary {
            subtype: BinarySubtype::UuidOld,
            bytes,
        },
    }))
}

fn is_function(function: &Function, name: &str) -> bool {
    function.name.eq_ignore_ascii_case(name)
}

fn comparison_operator(op: CompareOp) -> Option<&'static str> {
    match op {
        CompareOp::Eq => Some("$eq"),
        CompareOp::Gt => Some("$gt"),
        CompareOp::GtEq => Some("$gte"),
        CompareOp::Lt => Some("$lt"),
        CompareOp::LtEq => Some("$lte"),
        CompareOp::NotEq => None,
    }
}
