//! Loosely-typed remote records and the typed views over them.
//!
//! Pages and blocks keep their raw JSON so that one malformed property never
//! prevents the rest of a record from being read. Typed interpretation
//! happens on access, see [`crate::property`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{BlockId, DatabaseId, PageId};

// ---------------------------------------------------------------------------
// Pages and property values
// ---------------------------------------------------------------------------

/// A page or database row, with properties left as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

/// One rich-text segment. Only the rendered plain text is of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelationRef {
    pub id: PageId,
}

/// Result of a computed (formula) property.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    Number { number: Option<f64> },
    #[serde(other)]
    Other,
}

/// A property value, tagged by the kind the API reports for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    Select { select: Option<SelectOption> },
    Formula { formula: FormulaValue },
    Relation { relation: Vec<RelationRef> },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Title { .. } => "title",
            PropertyValue::Select { .. } => "select",
            PropertyValue::Formula { .. } => "formula",
            PropertyValue::Relation { .. } => "relation",
            PropertyValue::Unsupported => "unsupported",
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Block kinds the template copier treats specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    NestedDatabase,
    Unsupported,
    SyncedReference,
    NestedPage,
    /// Any other kind; copied as a shallow payload.
    Other,
}

impl BlockKind {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "child_database" => BlockKind::NestedDatabase,
            "unsupported" => BlockKind::Unsupported,
            "synced_block" => BlockKind::SyncedReference,
            "child_page" => BlockKind::NestedPage,
            _ => BlockKind::Other,
        }
    }

    /// Kinds that cannot be recreated faithfully from their payload.
    pub fn is_excluded(self) -> bool {
        matches!(
            self,
            BlockKind::Unsupported | BlockKind::SyncedReference | BlockKind::NestedPage
        )
    }
}

/// A child block as listed by the API.
///
/// The kind-specific payload lives under the key named by `kind`, inside
/// `extra` together with bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn block_kind(&self) -> BlockKind {
        BlockKind::from_type(&self.kind)
    }

    /// The kind-specific payload object, if present.
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.extra.get(&self.kind).and_then(Value::as_object)
    }

    /// Title of a nested-database block.
    ///
    /// The API reports it as a plain string; older payloads carry a rich-text
    /// list, in which case the first segment is used.
    pub fn nested_database_title(&self) -> Option<&str> {
        if self.block_kind() != BlockKind::NestedDatabase {
            return None;
        }
        match self.payload()?.get("title")? {
            Value::String(s) => Some(s.as_str()),
            Value::Array(segments) => segments
                .first()?
                .get("plain_text")
                .and_then(Value::as_str),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Database schemas
// ---------------------------------------------------------------------------

/// One field definition of a database schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

/// A retrieved database with its field definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub id: DatabaseId,
    #[serde(default)]
    pub title: Vec<RichText>,
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaField>,
}

// ---------------------------------------------------------------------------
// Block descriptors for creation
// ---------------------------------------------------------------------------

/// A block to be created under a target page.
#[derive(Debug, Clone, PartialEq)]
pub enum NewBlock {
    /// An ordinary block: kind plus a shallow copy of its payload.
    Content {
        kind: String,
        payload: Map<String, Value>,
    },
    /// A brand-new inline database with the given title and schema.
    NestedDatabase {
        title: String,
        properties: BTreeMap<String, SchemaField>,
    },
}

impl NewBlock {
    pub fn kind(&self) -> &str {
        match self {
            NewBlock::Content { kind, .. } => kind,
            NewBlock::NestedDatabase { .. } => "child_database",
        }
    }

    /// Request-body form of the descriptor.
    pub fn to_json(&self) -> Value {
        match self {
            NewBlock::Content { kind, payload } => {
                let mut obj = Map::new();
                obj.insert("type".to_owned(), Value::String(kind.clone()));
                obj.insert(kind.clone(), Value::Object(payload.clone()));
                Value::Object(obj)
            }
            NewBlock::NestedDatabase { title, properties } => json!({
                "type": "child_database",
                "child_database": {
                    "title": text_content(title),
                    "properties": properties,
                },
            }),
        }
    }
}

/// Rich-text array holding a single plain text segment, as used in writes.
pub fn text_content(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}
