//! Translate a subset of SQL (SELECT and DELETE) into MongoDB
//! operations: a target collection, an operation shape (`find`, `count`,
//! `distinct`, `aggregate`, `deleteMany`), and the filter, projection,
//! sort, and pipeline documents that express the same semantics.
//!
//! ```
//! use sql2mongo::{translate_sql, Operation, TranslateOptions};
//!
//! let plan = translate_sql(
//!     "select * from my_table where value = 1",
//!     &TranslateOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(plan.operation, Operation::Find);
//! assert_eq!(plan.collection, "my_table");
//! ```

pub mod ast;
pub mod options;
mod parser;
pub mod result;
mod shell;
mod translator;
mod util;


pub use options::{FieldType, RenderOptions, TranslateOptions};
pub use result::{Error, Result};
pub use translator::{JoinPlanner, Operation, QueryPlan, Translator};

/// Translate one SQL statement into a [`QueryPlan`].
///
/// The plan carries everything needed to describe the MongoDB operation;
/// call [`QueryPlan::shell`] to render it in shell syntax.
pub fn translate_sql(sql: &str, options: &TranslateOptions) -> Result<QueryPlan> {
    let statement = parser::parse_statement(sql)?;
    let plan = Translator::new(options).translate(&statement)?;
    Ok(plan)
}
