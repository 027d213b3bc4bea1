//! Projection, `$group`, alias-projection, and `$sort` builders.

use super::values::value_text;
use super::{Error, Result, Translator};
use crate::ast::{CompareOp, Expression, Function, Literal, OrderByItem, SelectItem};
use bson::{doc, Bson, Document};

impl Translator<'_> {
    /// Projection for a plain SELECT (no GROUP BY): columns and aliased
    /// columns, CASE expressions, and subtractions. `_id` is suppressed
    /// unless listed.
    pub(crate) fn build_projection(&self, items: &[SelectItem]) -> Result<Document> {
        let mut projection = doc! { "_id": 0_i32 };
        for item in items {
            let (expr, alias) = match item {
                SelectItem::Expr { expr, alias } => (expr, alias.as_deref()),
                SelectItem::AllColumns => return Err(Error::UnsupportedProjection),
            };
            match expr {
                Expression::Column(column) => {
                    let name = column.name();
                    match alias {
                        Some(alias) => projection.insert(alias, format!("${name}")),
                        None => projection.insert(name, Bson::Int32(1)),
                    };
                }
                Expression::Case { .. } => {
                    let alias = alias.ok_or(Error::UnsupportedProjection)?;
                    projection.insert(flatten_field(alias), switch_document(expr)?);
                }
                Expression::Subtract { left, right } => {
                    let alias = alias.ok_or(Error::UnsupportedProjection)?;
                    projection.insert(alias, subtract_document(left, right)?);
                }
                _ => return Err(Error::UnsupportedProjection),
            }
        }
        Ok(projection)
    }

    /// Build the `$group` body and the alias projection that restores
    /// user-visible names after grouping.
    pub(crate) fn build_group_stage(
        &self,
        items: &[SelectItem],
        group_bys: &[String],
    ) -> Result<(Document, Document)> {
        let (function_items, plain_items): (Vec<&SelectItem>, Vec<&SelectItem>) = items
            .iter()
            .partition(|item| matches!(item, SelectItem::Expr { expr: Expression::Function(_), .. }));

        let group = self.build_group_body(&function_items, &plain_items, group_bys)?;
        let alias_projection = self.build_alias_projection(&function_items, &plain_items)?;
        Ok((group, alias_projection))
    }

    fn build_group_body(
        &self,
        function_items: &[&SelectItem],
        plain_items: &[&SelectItem],
        group_bys: &[String],
    ) -> Result<Document> {
        let mut id = Document::new();
        for item in plain_items {
            let (expr, alias) = match item {
                SelectItem::Expr { expr, alias } => (expr, alias.as_deref()),
                SelectItem::AllColumns => return Err(Error::UnsupportedProjection),
            };
            match expr {
                Expression::Case { .. } => {
                    // a CASE only contributes a key when its alias names a
                    // grouped column
                    if let Some(name) = alias.filter(|a| group_bys.iter().any(|g| g.as_str() == *a)) {
                        id.insert(name, format!("${name}"));
                    }
                }
                Expression::Column(column) => {
                    let name = column.name();
                    id.insert(flatten_field(&name), format!("${name}"));
                }
                _ => return Err(Error::UnsupportedProjection),
            }
        }
        for group_key in group_bys {
            let flattened = flatten_field(group_key);
            if !id.contains_key(group_key) && !id.contains_key(&flattened) {
                id.insert(flattened, format!("${group_key}"));
            }
        }

        let mut group = Document::new();
        let id_value = if id.len() == 1 {
            id.iter()
                .next()
                .map(|(_, v)| v.clone())
                .unwrap_or(Bson::Null)
        } else {
            Bson::Document(id)
        };
        group.insert("_id", id_value);

        for item in function_items {
            let (function, alias) = match item {
                SelectItem::Expr {
                    expr: Expression::Function(function),
                    alias,
                } => (function, alias.as_deref()),
                _ => return Err(Error::UnsupportedProjection),
            };
            group.insert(
                aggregate_output_key(function, alias)?,
                aggregate_accumulator(function)?,
            );
        }
        Ok(group)
    }

    fn build_alias_projection(
        &self,
        function_items: &[&SelectItem],
        plain_items: &[&SelectItem],
    ) -> Result<Document> {
        let mut projection = Document::new();
        if let [SelectItem::Expr {
            expr: Expression::Column(column),
            alias,
        }] = plain_items
        {
            let name = column.name();
            projection.insert(alias.as_deref().unwrap_or(&name), "$_id");
        } else {
            for item in plain_items {
                let (expr, alias) = match item {
                    SelectItem::Expr { expr, alias } => (expr, alias.as_deref()),
                    SelectItem::AllColumns => return Err(Error::UnsupportedProjection),
                };
                match expr {
                    Expression::Case { .. } => {
                        let alias = alias.ok_or(Error::UnsupportedProjection)?;
                        projection.insert(flatten_field(alias), switch_document(expr)?);
                    }
                    Expression::Column(column) => {
                        let name = column.name();
                        projection.insert(
                            alias.unwrap_or(&name),
                            format!("$_id.{}", flatten_field(&name)),
                        );
                    }
                    _ => return Err(Error::UnsupportedProjection),
                }
            }
        }
        for item in function_items {
            let (function, alias) = match item {
                SelectItem::Expr {
                    expr: Expression::Function(function),
                    alias,
                } => (function, alias.as_deref()),
                _ => return Err(Error::UnsupportedProjection),
            };
            let name = function.name.to_lowercase();
            projection.insert(alias.unwrap_or(&name), Bson::Int32(1));
        }
        projection.insert("_id", 0_i32);
        Ok(projection)
    }

    /// `$sort` keys: grouped columns are rewritten to their `_id` form,
    /// and aggregate-function elements sort by the SELECT alias when one
    /// exists, otherwise by the recomputed output key.
    pub(crate) fn build_sort(
        &self,
        order_by: &[OrderByItem],
        items: &[SelectItem],
        group_bys: &[String],
    ) -> Result<Document> {
        let mut sort = Document::new();
        for element in order_by {
            let direction = if element.ascending {
                Bson::Int32(1)
            } else {
                Bson::Int32(-1)
            };
            match &element.expr {
                Expression::Function(function) => {
                    let alias = items.iter().find_map(|item| match item {
                        SelectItem::Expr {
                            expr,
                            alias: Some(alias),
                        } if expr == &element.expr => Some(alias.clone()),
                        _ => None,
                    });
                    let key = match alias {
                        Some(alias) => alias,
                        None => aggregate_output_key(function, None)?,
                    };
                    sort.insert(key, direction);
                }
                other => {
                    let mut field = value_text(other);
                    if !group_bys.is_empty() {
                        field = if group_bys.len() > 1 {
                            format!("_id.{}", flatten_field(&field))
                        } else {
                            "_id".to_string()
                        };
                    }
                    sort.insert(field, direction);
                }
            }
        }
        Ok(sort)
    }
}

/// The `$group` output key for an aggregate call: the alias when given,
/// `count` for COUNT, otherwise `op_column` with dots flattened.
pub(super) fn aggregate_output_key(function: &Function, alias: Option<&str>) -> Result<String> {
    if let Some(alias) = alias {
        return Ok(alias.to_string());
    }
    let name = function.name.to_lowercase();
    match name.as_str() {
        "count" => Ok("count".to_string()),
        "sum" | "avg" | "min" | "max" => {
            let field = aggregate_field(function)?;
            Ok(format!("{name}_{}", flatten_field(&field)))
        }
        _ => Err(Error::UnknownFunction(function.name.clone())),
    }
}

/// The accumulator document: `{$sum: 1}` for COUNT (with or without an
/// argument), `{$op: "$column"}` for the rest.
fn aggregate_accumulator(function: &Function) -> Result<Document> {
    let name = function.name.to_lowercase();
    match name.as_str() {
        "count" => {
            if function.args.len() > 1 {
                return Err(Error::FunctionArity(function.name.clone()));
            }
            Ok(doc! { "$sum": 1_i32 })
        }
        "sum" | "avg" | "min" | "max" => {
            let field = aggregate_field(function)?;
            Ok(doc! { format!("${name}"): format!("${field}") })
        }
        _ => Err(Error::UnknownFunction(function.name.clone())),
    }
}

fn aggregate_field(function: &Function) -> Result<String> {
    if function.args.len() > 1 {
        return Err(Error::FunctionArity(function.name.clone()));
    }
    match function.args.first() {
        Some(arg) => Ok(value_text(arg)),
        None => Err(Error::MissingAggregateField(
            function.name.to_lowercase(),
        )),
    }
}

/// Lower a CASE expression to `$switch`. Column operands inside the
/// branch comparisons are referenced through the group key (`$_id.`),
/// matching the original translator even when no GROUP BY is present.
pub(super) fn switch_document(case: &Expression) -> Result<Document> {
    let (branches, else_result) = match case {
        Expression::Case {
            branches,
            else_result,
        } => (branches, else_result),
        other => return Err(Error::UnsupportedExpression(other.to_string())),
    };
    let lowered: Vec<Bson> = branches
        .iter()
        .map(|(when, then)| {
            let (op, left, right) = match when {
                Expression::Comparison { op, left, right } => (op, left, right),
                other => return Err(Error::UnsupportedExpression(other.to_string())),
            };
            let operator = match op {
                CompareOp::Eq => "$eq",
                CompareOp::Gt => "$gt",
                CompareOp::GtEq => "$gte",
                CompareOp::Lt => "$lt",
                CompareOp::LtEq => "$lte",
                CompareOp::NotEq => {
                    return Err(Error::UnsupportedExpression(when.to_string()))
                }
            };
            let left = branch_operand(left)?;
            let right = branch_operand(right)?;
            Ok(Bson::Document(doc! {
                "case": { operator: [left, right] },
                "then": case_operand(then)?,
            }))
        })
        .collect::<Result<_>>()?;
    let default = match else_result {
        Some(expr) => case_operand(expr)?,
        None => Bson::Null,
    };
    Ok(doc! { "$switch": { "branches": lowered, "default": default } })
}

// Branch comparison operands get the `$_id.` prefix on columns; THEN and
// ELSE operands keep bare values.
fn branch_operand(expr: &Expression) -> Result<Bson> {
    match expr {
        Expression::Column(column) => Ok(Bson::String(format!("$_id.{}", column.name()))),
        _ => case_operand(expr),
    }
}

fn case_operand(expr: &Expression) -> Result<Bson> {
    match expr {
        Expression::Case { .. } => Ok(Bson::Document(switch_document(expr)?)),
        Expression::Column(column) => Ok(Bson::String(column.name())),
        Expression::Literal(Literal::Long(n)) => Ok(Bson::Int64(*n)),
        Expression::Literal(Literal::Double(d)) => Ok(Bson::Double(*d)),
        Expression::Literal(Literal::String(s)) => Ok(Bson::String(s.clone())),
        Expression::Literal(Literal::Boolean(b)) => Ok(Bson::Boolean(*b)),
        other => Err(Error::UnsupportedExpression(other.to_string())),
    }
}

/// `$subtract` of two columns or literals; column operands are `$`-prefixed.
pub(super) fn subtract_document(left: &Expression, right: &Expression) -> Result<Bson> {
    let operand = |expr: &Expression| -> Result<Bson> {
        match expr {
            Expression::Column(column) => Ok(Bson::String(format!("${}", column.name()))),
            _ => case_operand(expr),
        }
    };
    Ok(Bson::Document(
        doc! { "$subtract": [operand(left)?, operand(right)?] },
    ))
}

/// Dotted field names become `_`-joined keys inside `$group` documents.
pub(super) fn flatten_field(name: &str) -> String {
    name.replace('.', "_")
}
