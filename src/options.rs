use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-supplied coercion hint for a column. A column missing from the
/// field-type map falls back to [`TranslateOptions::default_field_type`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    #[default]
    Unknown,
}

/// Options passed in for translation, used throughout the lowering
/// components.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Dotted column name to coercion type.
    pub field_types: HashMap<String, FieldType>,
    /// Applied when a column has no entry in `field_types`.
    pub default_field_type: FieldType,
}

impl TranslateOptions {
    pub fn new(field_types: HashMap<String, FieldType>, default_field_type: FieldType) -> Self {
        TranslateOptions {
            field_types,
            default_field_type,
        }
    }

    pub fn with_field_type(mut self, column: &str, field_type: FieldType) -> Self {
        self.field_types.insert(column.to_string(), field_type);
        self
    }

    pub fn with_default_field_type(mut self, field_type: FieldType) -> Self {
        self.default_field_type = field_type;
        self
    }
}

/// Knobs consulted only when rendering an aggregation to shell syntax.
/// When both are unset the options document is omitted entirely.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub allow_disk_use: Option<bool>,
    pub batch_size: Option<i32>,
}
