//! Mechanical rendering of a [`QueryPlan`] to MongoDB shell syntax.

mod json;


use crate::options::RenderOptions;
use crate::translator::{Operation, QueryPlan};
use bson::{doc, Document};
use itertools::Itertools;
use json::pretty_document;

pub(crate) fn render(plan: &QueryPlan, options: &RenderOptions) -> String {
    let mut out = format!("db.{}.", plan.collection);
    match plan.operation {
        Operation::Distinct => {
            out.push_str("distinct(");
            out.push('"');
            out.push_str(distinct_field(plan));
            out.push('"');
            out.push_str(" , ");
            out.push_str(&pretty_document(&plan.filter));
            out.push(')');
        }
        Operation::Count => {
            out.push_str("count(");
            out.push_str(&pretty_document(&plan.filter));
            out.push(')');
        }
        Operation::Delete => {
            out.push_str("deleteMany(");
            out.push_str(&pretty_document(&plan.filter));
            out.push(')');
        }
        Operation::Aggregate => {
            out.push_str("aggregate(");
            out.push('[');
            out.push_str(
                &plan
                    .pipeline()
                    .iter()
                    .map(pretty_document)
                    .join(","),
            );
            out.push(']');
            let options = options_document(options);
            if !options.is_empty() {
                out.push(',');
                out.push_str(&pretty_document(&options));
            }
            out.push(')');
        }
        Operation::Find => {
            out.push_str("find(");
            out.push_str(&pretty_document(&plan.filter));
            if !plan.projection.is_empty() {
                out.push_str(" , ");
                out.push_str(&pretty_document(&plan.projection));
            }
            out.push(')');
            if !plan.sort.is_empty() {
                out.push_str(".sort(");
                out.push_str(&pretty_document(&plan.sort));
                out.push(')');
            }
            if plan.offset != -1 {
                out.push_str(&format!(".skip({})", plan.offset));
            }
            if plan.limit != -1 {
                out.push_str(&format!(".limit({})", plan.limit));
            }
        }
    }
    out
}

fn distinct_field(plan: &QueryPlan) -> &str {
    plan.projection
        .keys()
        .next()
        .map(String::as_str)
        .unwrap_or_default()
}

fn options_document(options: &RenderOptions) -> Document {
    let mut document = Document::new();
    if let Some(allow_disk_use) = options.allow_disk_use {
        document.insert("allowDiskUse", allow_disk_use);
    }
    if let Some(batch_size) = options.batch_size {
        document.insert("cursor", doc! { "batchSize": batch_size });
    }
    document
}
