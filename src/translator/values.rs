//! Literal coercion driven by the field-type map.

use super::{Error, Result};
use crate::ast::{Expression, Literal};
use crate::options::{FieldType, TranslateOptions};
use chrono::{DateTime, NaiveDate, Utc};
use interim::{parse_date_string, Dialect};

/// Coerce an expression in value position into a BSON value. The field
/// type is looked up from the column on the *other* side of the
/// comparison; with no other side the value passes through untyped.
pub(crate) fn coerce_value(
    expr: &Expression,
    other_side: Option<&Expression>,
    options: &TranslateOptions,
) -> Result<bson::Bson> {
    let field_type = match other_side {
        Some(other) => options
            .field_types
            .get(&value_text(other))
            .copied()
            .unwrap_or(options.default_field_type),
        None => FieldType::Unknown,
    };
    normalize(expr, field_type)
}

fn normalize(expr: &Expression, field_type: FieldType) -> Result<bson::Bson> {
    let text = value_text(expr);
    match field_type {
        FieldType::Unknown => match expr {
            Expression::Literal(Literal::Boolean(b)) => Ok(bson::Bson::Boolean(*b)),
            Expression::Literal(Literal::Long(n)) => Ok(bson::Bson::Int64(*n)),
            Expression::Literal(Literal::Double(d)) => Ok(bson::Bson::Double(*d)),
            Expression::Literal(Literal::String(_)) | Expression::Column(_) => {
                Ok(force_bool(&text).unwrap_or(bson::Bson::String(text)))
            }
            other => Err(Error::UnsupportedValue(other.to_string())),
        },
        FieldType::String => match expr {
            Expression::Literal(_) | Expression::Column(_) => Ok(bson::Bson::String(text)),
            other => Err(Error::UnsupportedValue(other.to_string())),
        },
        FieldType::Number => force_number(expr, &text),
        FieldType::Date => Ok(bson::Bson::DateTime(parse_date(&text)?)),
        FieldType::Boolean => Ok(bson::Bson::Boolean(text.eq_ignore_ascii_case("true"))),
    }
}

/// The textual form of an expression used for field-type lookups, filter
/// keys, and aggregate operands.
pub(crate) fn value_text(expr: &Expression) -> String {
    match expr {
        Expression::Literal(Literal::String(s)) => s.clone(),
        Expression::Column(c) => c.name(),
        Expression::Literal(Literal::Long(n)) => n.to_string(),
        Expression::Literal(Literal::Double(d)) => d.to_string(),
        Expression::Literal(Literal::Boolean(b)) => b.to_string(),
        Expression::Wildcard => "*".to_string(),
        other => other.to_string(),
    }
}

/// The document key an expression names: a column or a quoted string.
pub(crate) fn field_name(expr: &Expression) -> Result<String> {
    match expr {
        Expression::Column(c) => Ok(c.name()),
        Expression::Literal(Literal::String(s)) => Ok(s.clone()),
        other => Err(Error::UnsupportedExpression(other.to_string())),
    }
}

fn force_bool(text: &str) -> Option<bson::Bson> {
    if text.eq_ignore_ascii_case("true") {
        Some(bson::Bson::Boolean(true))
    } else if text.eq_ignore_ascii_case("false") {
        Some(bson::Bson::Boolean(false))
    } else {
        None
    }
}

fn force_number(expr: &Expression, text: &str) -> Result<bson::Bson> {
    match expr {
        Expression::Literal(Literal::Long(n)) => Ok(bson::Bson::Int64(*n)),
        Expression::Literal(Literal::Double(d)) => Ok(bson::Bson::Double(*d)),
        _ => {
            if let Ok(n) = text.parse::<i64>() {
                Ok(bson::Bson::Int64(n))
            } else if let Ok(d) = text.parse::<f64>() {
                Ok(bson::Bson::Double(d))
            } else {
                Err(Error::BadNumber(text.to_string()))
            }
        }
    }
}

/// Parse a date string: ISO-8601 date-time, then `YYYY-MM-DD`, then
/// `YYYYMMDD`, then natural language. Fixed formats resolve to UTC
/// midnight.
pub(crate) fn parse_date(text: &str) -> Result<bson::DateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(bson::DateTime::from_millis(dt.timestamp_millis()));
    }
    for format in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(bson::DateTime::from_millis(
                    midnight.and_utc().timestamp_millis(),
                ));
            }
        }
    }
    natural_date(text).map_err(|_| Error::BadDate(text.to_string()))
}

/// Parse a natural-language date like "45 days ago".
pub(crate) fn natural_date(text: &str) -> Result<bson::DateTime> {
    parse_date_string(text, Utc::now(), Dialect::Us)
        .map(|dt| bson::DateTime::from_millis(dt.timestamp_millis()))
        .map_err(|_| Error::BadNaturalDate(text.to_string()))
}
