//! Template materialization.
//!
//! Template blocks are turned into creatable descriptors one level deep:
//! children of copied blocks are not followed. Nested databases are rebuilt
//! from their schema, minus the field kinds that cannot be set at creation.
//! Synced blocks, child pages and unsupported blocks are dropped.

use std::collections::BTreeMap;

use serde_json::Map;

use pmsync_core::{
    ApiError, Block, BlockKind, DatabaseId, DatabaseSchema, NewBlock, NotionApi, PageId,
    SchemaField,
};

use crate::error::SyncError;

/// Schema field kinds computed by the API; they cannot be created.
pub const NON_CREATABLE_FIELD_KINDS: [&str; 4] =
    ["rollup", "formula", "created_time", "last_edited_time"];

/// Payload keys that describe the source block rather than its content.
const BOOKKEEPING_KEYS: [&str; 4] = ["id", "has_children", "created_time", "type"];

/// Field definitions of `schema` that can be used to create a new database.
pub fn clone_schema(schema: &DatabaseSchema) -> BTreeMap<String, SchemaField> {
    schema
        .properties
        .iter()
        .filter(|(_, field)| !NON_CREATABLE_FIELD_KINDS.contains(&field.kind.as_str()))
        .map(|(name, field)| (name.clone(), field.clone()))
        .collect()
}

/// Shallow copy of an ordinary block.
fn copy_block(block: &Block) -> NewBlock {
    let payload: Map<_, _> = block
        .payload()
        .map(|p| {
            p.iter()
                .filter(|(key, _)| !BOOKKEEPING_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();
    NewBlock::Content {
        kind: block.kind.clone(),
        payload,
    }
}

/// Convert template blocks into descriptors, in source order.
///
/// A nested database whose schema cannot be retrieved is skipped; the target
/// page then has no nested table and the locator reports it later.
pub fn transform(api: &dyn NotionApi, blocks: &[Block], table_title: &str) -> Vec<NewBlock> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block.block_kind() {
            BlockKind::NestedDatabase => {
                let source = DatabaseId::from(block.id.clone());
                match api.retrieve_database(&source) {
                    Ok(schema) => out.push(NewBlock::NestedDatabase {
                        title: table_title.to_owned(),
                        properties: clone_schema(&schema),
                    }),
                    Err(err) => {
                        tracing::error!(
                            database = %source,
                            error = %err,
                            "schema retrieval failed, skipping nested database"
                        );
                    }
                }
            }
            kind if kind.is_excluded() => {
                tracing::debug!(block = %block.id, kind = %block.kind, "dropping template block");
            }
            _ => out.push(copy_block(block)),
        }
    }
    out
}

/// Copy the template page's content into `target`.
///
/// Returns the number of descriptors appended.
pub fn materialize(
    api: &dyn NotionApi,
    template: &PageId,
    target: &PageId,
    table_title: &str,
) -> Result<usize, SyncError> {
    let template_err = |source: ApiError| SyncError::Template {
        template: template.clone(),
        page: target.clone(),
        source,
    };

    let blocks = api.list_children(template).map_err(template_err)?;
    let children = transform(api, &blocks, table_title);
    if !children.is_empty() {
        api.append_children(target, &children).map_err(template_err)?;
    }
    tracing::info!(page = %target, blocks = children.len(), "copied template content");
    Ok(children.len())
}
