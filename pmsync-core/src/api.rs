//! The remote capability surface the sync engine depends on.
//!
//! Every method is a blocking point operation. Implementations own
//! pagination: list-style calls return the complete result set.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::ApiError;
use crate::model::{text_content, Block, DatabaseSchema, NewBlock, Page};
use crate::types::{DatabaseId, PageId};

/// Row filter for database queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Exact, case-sensitive match on a title-typed property.
    TitleEquals { property: String, value: String },
}

impl Filter {
    pub fn title_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::TitleEquals {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Filter::TitleEquals { property, value } => json!({
                "property": property,
                "title": { "equals": value },
            }),
        }
    }
}

/// A property value to write on create/update.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyWrite {
    Title(String),
    Select(String),
    Number(f64),
}

impl PropertyWrite {
    pub fn to_json(&self) -> Value {
        match self {
            PropertyWrite::Title(text) => json!({ "title": text_content(text) }),
            PropertyWrite::Select(label) => json!({ "select": { "name": label } }),
            PropertyWrite::Number(n) => json!({ "number": n }),
        }
    }
}

/// Properties keyed by field name.
pub type PropertyWrites = BTreeMap<String, PropertyWrite>;

/// Request-body form of a property map.
pub fn writes_to_json(writes: &PropertyWrites) -> Value {
    Value::Object(
        writes
            .iter()
            .map(|(name, write)| (name.clone(), write.to_json()))
            .collect(),
    )
}

/// Point operations against the document/database API.
pub trait NotionApi {
    /// All rows of `database` matching `filter` (all rows when `None`), in
    /// the order the API returns them.
    fn query_database(
        &self,
        database: &DatabaseId,
        filter: Option<&Filter>,
    ) -> Result<Vec<Page>, ApiError>;

    fn retrieve_page(&self, page: &PageId) -> Result<Page, ApiError>;

    fn create_page(&self, parent: &DatabaseId, properties: &PropertyWrites)
        -> Result<Page, ApiError>;

    fn update_page(&self, page: &PageId, properties: &PropertyWrites) -> Result<Page, ApiError>;

    /// Direct children of `page`, in content order.
    fn list_children(&self, page: &PageId) -> Result<Vec<Block>, ApiError>;

    /// Append `children` to the end of `page`, preserving their order.
    fn append_children(&self, page: &PageId, children: &[NewBlock]) -> Result<(), ApiError>;

    fn retrieve_database(&self, database: &DatabaseId) -> Result<DatabaseSchema, ApiError>;
}
