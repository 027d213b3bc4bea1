//! Semantic lowering from the parsed AST to a [`QueryPlan`].
//!
//! The submodules mirror the lowering components: `values` coerces
//! literals, `matchers` recognizes specialty function shapes,
//! `expressions` lowers WHERE clauses, and `stages` builds the
//! projection, group, and sort documents. This module owns validation,
//! output-shape selection, and assembly.

use crate::ast::{
    Column, Expression, Function, Join, SelectItem, SelectStatement, Statement,
};
use crate::options::TranslateOptions;
use bson::Document;
use thiserror::Error;

pub mod definitions;
mod expressions;
mod matchers;
mod stages;
mod values;


pub use definitions::{Operation, QueryPlan};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported project expression")]
    UnsupportedProjection,
    #[error("cannot run distinct one more than one column")]
    UnsupportedDistinct,
    #[error("illegal expression(s) found in select clause. Only column names supported")]
    IllegalSelectItem,
    #[error("NOT LIKE queries not supported")]
    UnsupportedLike,
    #[error("Join type not suported")]
    UnsupportedJoin,
    #[error("{0} function can only have one parameter")]
    FunctionArity(String),
    #[error("could not understand function: {0}")]
    UnknownFunction(String),
    #[error("function {0} must contain a single field to run on")]
    MissingAggregateField(String),
    #[error("could not convert {0} to a date")]
    BadDate(String),
    #[error("could not natural language date: {0}")]
    BadNaturalDate(String),
    #[error("could not convert {0} to number")]
    BadNumber(String),
    #[error("false is not allowed for regexMatch function")]
    RegexMatchFalse,
    #[error("{0}")]
    Regex(String),
    #[error("invalid hexadecimal representation of an ObjectId: {0}")]
    InvalidObjectId(String),
    #[error("invalid base64 binary data: {0}")]
    InvalidBinary(String),
    #[error("unable to convert expression to a value: {0}")]
    UnsupportedValue(String),
    #[error("unable to translate expression: {0}")]
    UnsupportedExpression(String),
}

/// External collaborator that turns JOIN clauses into the pipeline
/// stages spliced between `$match` and `$group`. The core only defines
/// this seam; building `$lookup` pipelines is someone else's job.
pub trait JoinPlanner {
    fn pipeline(&self, joins: &[Join], filter: Option<&Expression>) -> Result<Vec<Document>>;
}

#[derive(Clone, Copy)]
pub struct Translator<'a> {
    options: &'a TranslateOptions,
    join_planner: Option<&'a dyn JoinPlanner>,
}

impl<'a> Translator<'a> {
    pub fn new(options: &'a TranslateOptions) -> Self {
        Translator {
            options,
            join_planner: None,
        }
    }

    pub fn with_join_planner(mut self, planner: &'a dyn JoinPlanner) -> Self {
        self.join_planner = Some(planner);
        self
    }

    pub fn translate(&self, statement: &Statement) -> Result<QueryPlan> {
        match statement {
            Statement::Select(select) => self.translate_select(select),
            Statement::Delete(delete) => {
                let mut plan = QueryPlan::new(delete.collection.clone());
                plan.operation = Operation::Delete;
                if let Some(filter) = &delete.filter {
                    plan.filter = self.lower_filter(filter)?;
                }
                Ok(plan)
            }
        }
    }

    fn translate_select(&self, select: &SelectStatement) -> Result<QueryPlan> {
        let select = erase_base_alias(select.clone());
        self.validate(&select)?;

        let has_alias = select.items.iter().any(|item| item.alias().is_some());
        let mut plan = QueryPlan::new(select.collection.clone());

        if select.distinct {
            plan.distinct = true;
            plan.projection
                .insert(distinct_field_name(&select.items), 1_i32);
        } else if !select.group_by.is_empty() {
            plan.group_bys = select.group_by.iter().map(Column::name).collect();
            let (group, alias_projection) =
                self.build_group_stage(&select.items, &plan.group_bys)?;
            plan.projection = group;
            plan.alias_projection = alias_projection;
        } else if is_count_all(&select.items) {
            plan.count_all = true;
        } else if !is_select_all(&select.items) {
            plan.projection = self.build_projection(&select.items)?;
        }

        if !select.joins.is_empty() {
            let planner = self.join_planner.ok_or(Error::UnsupportedJoin)?;
            plan.join_pipeline = planner.pipeline(&select.joins, select.filter.as_ref())?;
        }

        if !select.order_by.is_empty() {
            plan.sort = self.build_sort(&select.order_by, &select.items, &plan.group_bys)?;
        }

        if let Some(filter) = &select.filter {
            plan.filter = self.lower_filter(filter)?;
        }

        plan.offset = select.offset.unwrap_or(-1);
        plan.limit = select.limit.unwrap_or(-1);

        plan.operation = if plan.distinct {
            Operation::Distinct
        } else if plan.count_all {
            Operation::Count
        } else if !plan.group_bys.is_empty() || has_alias || !select.joins.is_empty() {
            Operation::Aggregate
        } else {
            Operation::Find
        };

        Ok(plan)
    }

    fn validate(&self, select: &SelectStatement) -> Result<()> {
        if select.distinct && (select.items.len() > 1 || is_select_all(&select.items)) {
            return Err(Error::UnsupportedDistinct);
        }
        let projectable = select
            .items
            .iter()
            .filter(|item| {
                matches!(
                    item,
                    SelectItem::Expr {
                        expr: Expression::Column(_)
                            | Expression::Case { .. }
                            | Expression::Subtract { .. },
                        ..
                    }
                )
            })
            .count();
        if select.group_by.is_empty()
            && projectable != select.items.len()
            && !is_select_all(&select.items)
            && !is_count_all(&select.items)
        {
            return Err(Error::IllegalSelectItem);
        }
        Ok(())
    }

    pub(crate) fn options(&self) -> &TranslateOptions {
        self.options
    }
}

fn is_select_all(items: &[SelectItem]) -> bool {
    matches!(items, [SelectItem::AllColumns])
}

fn is_count_all(items: &[SelectItem]) -> bool {
    match items {
        [SelectItem::Expr {
            expr: Expression::Function(Function { name, args }),
            ..
        }] => name.eq_ignore_ascii_case("count") && matches!(&args[..], [Expression::Wildcard]),
        _ => false,
    }
}

fn distinct_field_name(items: &[SelectItem]) -> String {
    match items.first() {
        Some(SelectItem::Expr {
            expr: Expression::Column(column),
            ..
        }) => column.name(),
        Some(SelectItem::Expr { expr, .. }) => expr.to_string(),
        _ => String::new(),
    }
}

// The base table's alias is just spelling; strip it from every column so
// filters and projections use the collection's own field names.
fn erase_base_alias(mut select: SelectStatement) -> SelectStatement {
    let alias = match select.table_alias.take() {
        Some(alias) => alias,
        None => return select,
    };
    select.items = select
        .items
        .into_iter()
        .map(|item| match item {
            SelectItem::Expr { expr, alias: a } => SelectItem::Expr {
                expr: erase_alias_expr(expr, &alias),
                alias: a,
            },
            item => item,
        })
        .collect();
    select.filter = select.filter.map(|f| erase_alias_expr(f, &alias));
    select.group_by = select
        .group_by
        .into_iter()
        .map(|c| erase_alias_column(c, &alias))
        .collect();
    select.order_by = select
        .order_by
        .into_iter()
        .map(|mut o| {
            o.expr = erase_alias_expr(o.expr, &alias);
            o
        })
        .collect();
    select
}

fn erase_alias_column(mut column: Column, alias: &str) -> Column {
    if column.parts.len() > 1 && column.parts[0] == alias {
        column.parts.remove(0);
    }
    column
}

fn erase_alias_expr(expr: Expression, alias: &str) -> Expression {
    let erase = |e: Box<Expression>| Box::new(erase_alias_expr(*e, alias));
    match expr {
        Expression::Column(column) => Expression::Column(erase_alias_column(column, alias)),
        Expression::Function(Function { name, args }) => Expression::Function(Function {
            name,
            args: args
                .into_iter()
                .map(|a| erase_alias_expr(a, alias))
                .collect(),
        }),
        Expression::Comparison { op, left, right } => Expression::Comparison {
            op,
            left: erase(left),
            right: erase(right),
        },
        Expression::Like {
            expr,
            pattern,
            negated,
        } => Expression::Like {
            expr: erase(expr),
            pattern: erase(pattern),
            negated,
        },
        Expression::InList {
            expr,
            list,
            negated,
        } => Expression::InList {
            expr: erase(expr),
            list: list
                .into_iter()
                .map(|e| erase_alias_expr(e, alias))
                .collect(),
            negated,
        },
        Expression::IsNull { expr, negated } => Expression::IsNull {
            expr: erase(expr),
            negated,
        },
        Expression::Logical { op, left, right } => Expression::Logical {
            op,
            left: erase(left),
            right: erase(right),
        },
        Expression::Not(inner) => Expression::Not(erase(inner)),
        Expression::Nested { inner, negated } => Expression::Nested {
            inner: erase(inner),
            negated,
        },
        Expression::Case {
            branches,
            else_result,
        } => Expression::Case {
            branches: branches
                .into_iter()
                .map(|(w, t)| (erase_alias_expr(w, alias), erase_alias_expr(t, alias)))
                .collect(),
            else_result: else_result.map(erase),
        },
        Expression::Subtract { left, right } => Expression::Subtract {
            left: erase(left),
            right: erase(right),
        },
        expr @ (Expression::Literal(_) | Expression::Wildcard) => expr,
    }
}
