//! Fixed-schema sub-databases kept under every project row of a manager's
//! nested table: one for freelance team payments, one for purchases.
//!
//! A sub-database is matched by title among the row page's children and is
//! only created when absent.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use pmsync_core::{ApiError, NewBlock, NotionApi, PageId, SchemaField};

use crate::error::SyncError;
use crate::locator;

pub const FREELANCE_TITLE: &str = "فريق الفرعي لانس";
pub const PURCHASES_TITLE: &str = "المشتريات";

/// A sub-database definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtable {
    pub title: &'static str,
    pub properties: BTreeMap<String, SchemaField>,
}

impl Subtable {
    fn descriptor(&self) -> NewBlock {
        NewBlock::NestedDatabase {
            title: self.title.to_owned(),
            properties: self.properties.clone(),
        }
    }
}

fn field(kind: &str, config: Value) -> SchemaField {
    let mut map = Map::new();
    map.insert(kind.to_owned(), config);
    SchemaField {
        kind: kind.to_owned(),
        config: map,
    }
}

fn select(options: &[(&str, &str)]) -> SchemaField {
    let options: Vec<_> = options
        .iter()
        .map(|(name, color)| json!({ "name": name, "color": color }))
        .collect();
    field("select", json!({ "options": options }))
}

fn schema(fields: Vec<(&str, SchemaField)>) -> BTreeMap<String, SchemaField> {
    fields
        .into_iter()
        .map(|(name, field)| (name.to_owned(), field))
        .collect()
}

/// Freelance team payments.
pub fn freelance() -> Subtable {
    Subtable {
        title: FREELANCE_TITLE,
        properties: schema(vec![
            ("نوع الصرف", field("title", json!({}))),
            ("اسم الشخص", field("rich_text", json!({}))),
            ("العمل", field("rich_text", json!({}))),
            ("المبلغ", field("number", json!({ "format": "number" }))),
            ("آيبان", field("rich_text", json!({}))),
            (
                "حالة الدفع",
                select(&[("مكتمل", "green"), ("جزئي", "yellow"), ("غير مدفوع", "red")]),
            ),
            ("إيصال", field("files", json!({}))),
        ]),
    }
}

/// Project purchases.
pub fn purchases() -> Subtable {
    Subtable {
        title: PURCHASES_TITLE,
        properties: schema(vec![
            ("نوع المصروف", field("title", json!({}))),
            ("تاريخ", field("date", json!({}))),
            ("المبلغ", field("number", json!({ "format": "number" }))),
            ("المبلغ بدون ضريبة", field("number", json!({ "format": "number" }))),
            ("إرفاق الفاتورة", field("files", json!({}))),
            ("دافع المبلغ", select(&[("الشركة", "blue"), ("المدير", "gray")])),
        ]),
    }
}

/// The sub-databases every project row should carry, in creation order.
pub fn project_subtables() -> Vec<Subtable> {
    vec![freelance(), purchases()]
}

/// Create whichever of `subtables` is missing under `row`.
///
/// Returns the number created. All missing ones go out in one append.
pub fn ensure(
    api: &dyn NotionApi,
    row: &PageId,
    subtables: &[Subtable],
) -> Result<usize, SyncError> {
    let blocks = api
        .list_children(row)
        .map_err(|source| SyncError::ListBlocks {
            page: row.clone(),
            source,
        })?;

    let missing: Vec<NewBlock> = subtables
        .iter()
        .filter(|table| locator::find_nested_table(&blocks, table.title).is_none())
        .map(Subtable::descriptor)
        .collect();
    if missing.is_empty() {
        return Ok(0);
    }

    api.append_children(row, &missing)
        .map_err(|source: ApiError| SyncError::Subtables {
            page: row.clone(),
            source,
        })?;
    tracing::info!(row = %row, created = missing.len(), "created project sub-databases");
    Ok(missing.len())
}
