use crate::options::RenderOptions;
use bson::{doc, Document};

/// The MongoDB operation a statement lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Find,
    Count,
    Distinct,
    Aggregate,
    Delete,
}

/// Everything needed to describe the lowered query: the collection, the
/// operation shape, and the component documents. Built once per input
/// statement and read-only afterwards.
///
/// When `group_bys` is non-empty, `projection` holds the `$group` body
/// (including its `_id` key) and `alias_projection` holds the final
/// `$project` stage that restores user-visible names.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub collection: String,
    pub operation: Operation,
    pub filter: Document,
    pub projection: Document,
    pub alias_projection: Document,
    pub sort: Document,
    /// -1 means unset.
    pub offset: i64,
    /// -1 means unset.
    pub limit: i64,
    pub group_bys: Vec<String>,
    pub distinct: bool,
    pub count_all: bool,
    /// Stages produced by the join collaborator, opaque to the core.
    pub join_pipeline: Vec<Document>,
}

impl QueryPlan {
    pub(crate) fn new(collection: String) -> Self {
        QueryPlan {
            collection,
            operation: Operation::Find,
            filter: Document::new(),
            projection: Document::new(),
            alias_projection: Document::new(),
            sort: Document::new(),
            offset: -1,
            limit: -1,
            group_bys: Vec::new(),
            distinct: false,
            count_all: false,
            join_pipeline: Vec::new(),
        }
    }

    /// Assemble the aggregation pipeline:
    /// `$match` → joins → `$group` → `$sort` → `$skip` → `$limit` → `$project`.
    pub fn pipeline(&self) -> Vec<Document> {
        let mut stages = vec![doc! { "$match": self.filter.clone() }];
        stages.extend(self.join_pipeline.iter().cloned());
        if !self.group_bys.is_empty() {
            stages.push(doc! { "$group": self.projection.clone() });
        }
        if !self.sort.is_empty() {
            stages.push(doc! { "$sort": self.sort.clone() });
        }
        if self.offset != -1 {
            stages.push(doc! { "$skip": self.offset });
        }
        if self.limit != -1 {
            stages.push(doc! { "$limit": self.limit });
        }
        if !self.alias_projection.is_empty() {
            stages.push(doc! { "$project": self.alias_projection.clone() });
        }
        if self.group_bys.is_empty() && !self.projection.is_empty() {
            stages.push(doc! { "$project": self.projection.clone() });
        }
        stages
    }

    /// Render the plan in MongoDB shell syntax.
    pub fn shell(&self, options: &RenderOptions) -> String {
        crate::shell::render(self, options)
    }
}
