//! In-memory `NotionApi` used by the integration tests.
//!
//! Records every call so tests can assert on remote traffic, and lets a test
//! make any specific call fail.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};

use pmsync_core::{
    property, ApiError, Block, DatabaseId, DatabaseSchema, FieldNames, Filter, NewBlock,
    NotionApi, Page, PageId, PropertyWrite, PropertyWrites, SyncConfig,
};

pub const PROJECTS_DB: &str = "projects-db";
pub const MANAGERS_DB: &str = "managers-db";
pub const TEMPLATE_PAGE: &str = "template-page";
pub const TEMPLATE_DB: &str = "template-db";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    Query(String),
    RetrievePage(String),
    CreatePage(String),
    UpdatePage(String),
    ListChildren(String),
    Append(String),
    RetrieveDatabase(String),
}

#[derive(Default)]
struct State {
    pages: HashMap<String, Page>,
    rows: HashMap<String, Vec<String>>,
    children: HashMap<String, Vec<Block>>,
    schemas: HashMap<String, DatabaseSchema>,
    next_id: usize,
}

impl State {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

#[derive(Default)]
pub struct MemoryNotion {
    state: RefCell<State>,
    calls: RefCell<Vec<Call>>,
    failures: RefCell<HashSet<Call>>,
}

fn status(endpoint: &str, status: u16, code: &str) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.to_owned(),
        status,
        code: code.to_owned(),
        message: "from MemoryNotion".to_owned(),
    }
}

/// Stored (read-side) shape of a written property.
fn stored_value(write: &PropertyWrite) -> Value {
    match write {
        PropertyWrite::Title(text) => json!({ "type": "title", "title": [{ "plain_text": text }] }),
        PropertyWrite::Select(label) => json!({ "type": "select", "select": { "name": label } }),
        PropertyWrite::Number(n) => json!({ "type": "number", "number": n }),
    }
}

impl MemoryNotion {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding ------------------------------------------------------------

    pub fn add_database(&self, id: &str) {
        self.state.borrow_mut().rows.entry(id.to_owned()).or_default();
    }

    pub fn add_row(&self, database: &str, page: Page) {
        let mut state = self.state.borrow_mut();
        state
            .rows
            .entry(database.to_owned())
            .or_default()
            .push(page.id.0.clone());
        state.pages.insert(page.id.0.clone(), page);
    }

    pub fn add_page(&self, page: Page) {
        self.state
            .borrow_mut()
            .pages
            .insert(page.id.0.clone(), page);
    }

    pub fn set_children(&self, parent: &str, blocks: Vec<Block>) {
        self.state
            .borrow_mut()
            .children
            .insert(parent.to_owned(), blocks);
    }

    pub fn add_schema(&self, id: &str, properties: Value) {
        let schema: DatabaseSchema =
            serde_json::from_value(json!({ "id": id, "properties": properties })).expect("schema");
        self.state
            .borrow_mut()
            .schemas
            .insert(id.to_owned(), schema);
    }

    pub fn fail_on(&self, call: Call) {
        self.failures.borrow_mut().insert(call);
    }

    pub fn clear_failures(&self) {
        self.failures.borrow_mut().clear();
    }

    // -- inspection ---------------------------------------------------------

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    pub fn reset_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn rows(&self, database: &str) -> Vec<Page> {
        let state = self.state.borrow();
        state
            .rows
            .get(database)
            .map(|ids| ids.iter().map(|id| state.pages[id].clone()).collect())
            .unwrap_or_default()
    }

    pub fn children(&self, parent: &str) -> Vec<Block> {
        self.state
            .borrow()
            .children
            .get(parent)
            .cloned()
            .unwrap_or_default()
    }

    pub fn schema(&self, id: &str) -> Option<DatabaseSchema> {
        self.state.borrow().schemas.get(id).cloned()
    }

    fn record(&self, call: Call, endpoint: &str) -> Result<(), ApiError> {
        let failing = self.failures.borrow().contains(&call);
        self.calls.borrow_mut().push(call);
        if failing {
            return Err(status(endpoint, 500, "internal_server_error"));
        }
        Ok(())
    }
}

impl NotionApi for MemoryNotion {
    fn query_database(
        &self,
        database: &DatabaseId,
        filter: Option<&Filter>,
    ) -> Result<Vec<Page>, ApiError> {
        self.record(Call::Query(database.0.clone()), "query")?;
        let state = self.state.borrow();
        let ids = state
            .rows
            .get(&database.0)
            .ok_or_else(|| status("query", 404, "object_not_found"))?;
        Ok(ids
            .iter()
            .map(|id| state.pages[id].clone())
            .filter(|page| match filter {
                None => true,
                Some(Filter::TitleEquals { property: name, value }) => {
                    property::title(page, name).as_deref() == Some(value.as_str())
                }
            })
            .collect())
    }

    fn retrieve_page(&self, page: &PageId) -> Result<Page, ApiError> {
        self.record(Call::RetrievePage(page.0.clone()), "retrieve page")?;
        self.state
            .borrow()
            .pages
            .get(&page.0)
            .cloned()
            .ok_or_else(|| status("retrieve page", 404, "object_not_found"))
    }

    fn create_page(
        &self,
        parent: &DatabaseId,
        properties: &PropertyWrites,
    ) -> Result<Page, ApiError> {
        self.record(Call::CreatePage(parent.0.clone()), "create page")?;
        let mut state = self.state.borrow_mut();
        if !state.rows.contains_key(&parent.0) {
            return Err(status("create page", 404, "object_not_found"));
        }
        let id = state.fresh_id("page");
        let page = Page {
            id: PageId(id.clone()),
            properties: properties
                .iter()
                .map(|(name, write)| (name.clone(), stored_value(write)))
                .collect(),
        };
        state.rows.entry(parent.0.clone()).or_default().push(id.clone());
        state.pages.insert(id, page.clone());
        Ok(page)
    }

    fn update_page(&self, page: &PageId, properties: &PropertyWrites) -> Result<Page, ApiError> {
        self.record(Call::UpdatePage(page.0.clone()), "update page")?;
        let mut state = self.state.borrow_mut();
        let stored = state
            .pages
            .get_mut(&page.0)
            .ok_or_else(|| status("update page", 404, "object_not_found"))?;
        for (name, write) in properties {
            stored.properties.insert(name.clone(), stored_value(write));
        }
        Ok(stored.clone())
    }

    fn list_children(&self, page: &PageId) -> Result<Vec<Block>, ApiError> {
        self.record(Call::ListChildren(page.0.clone()), "list children")?;
        Ok(self.children(&page.0))
    }

    fn append_children(&self, page: &PageId, children: &[NewBlock]) -> Result<(), ApiError> {
        self.record(Call::Append(page.0.clone()), "append children")?;
        let mut state = self.state.borrow_mut();
        for child in children {
            let block = match child {
                NewBlock::Content { kind, payload } => {
                    let id = state.fresh_id("block");
                    json!({ "id": id, "type": kind, kind.as_str(): payload })
                }
                NewBlock::NestedDatabase { title, properties } => {
                    let id = state.fresh_id("db");
                    state.rows.insert(id.clone(), Vec::new());
                    state.schemas.insert(
                        id.clone(),
                        DatabaseSchema {
                            id: DatabaseId(id.clone()),
                            title: Vec::new(),
                            properties: properties.clone(),
                        },
                    );
                    json!({ "id": id, "type": "child_database", "child_database": { "title": title } })
                }
            };
            let block: Block = serde_json::from_value(block).expect("block");
            state
                .children
                .entry(page.0.clone())
                .or_default()
                .push(block);
        }
        Ok(())
    }

    fn retrieve_database(&self, database: &DatabaseId) -> Result<DatabaseSchema, ApiError> {
        self.record(Call::RetrieveDatabase(database.0.clone()), "retrieve database")?;
        self.schema(&database.0)
            .ok_or_else(|| status("retrieve database", 404, "object_not_found"))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn config() -> SyncConfig {
    SyncConfig::from_settings(
        Some("secret".into()),
        Some(PROJECTS_DB.into()),
        Some(MANAGERS_DB.into()),
        Some(TEMPLATE_PAGE.into()),
        FieldNames::default(),
    )
    .expect("config")
}

/// Settings as `reconcile` and `push-status` resolve them, with no template.
pub fn config_without_template() -> SyncConfig {
    SyncConfig::without_template(
        Some("secret".into()),
        Some(PROJECTS_DB.into()),
        Some(MANAGERS_DB.into()),
        None,
        FieldNames::default(),
    )
    .expect("config")
}

pub fn fields() -> FieldNames {
    FieldNames::default()
}

pub fn title_prop(text: &str) -> Value {
    json!({ "id": "title", "type": "title", "title": [{ "type": "text", "plain_text": text }] })
}

pub fn select_prop(label: &str) -> Value {
    json!({ "type": "select", "select": { "name": label, "color": "default" } })
}

pub fn amount_prop(n: f64) -> Value {
    json!({ "type": "formula", "formula": { "type": "number", "number": n } })
}

pub fn relation_prop(ids: &[&str]) -> Value {
    let refs: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    json!({ "type": "relation", "relation": refs, "has_more": false })
}

pub fn page(id: &str, properties: Vec<(String, Value)>) -> Page {
    Page {
        id: PageId::from(id),
        properties: properties.into_iter().collect(),
    }
}

/// A source project with all four required fields.
pub fn project(id: &str, name: &str, status: &str, amount: f64, managers: &[&str]) -> Page {
    let f = fields();
    page(
        id,
        vec![
            (f.project_title, title_prop(name)),
            (f.project_status, select_prop(status)),
            (f.remaining_amount, amount_prop(amount)),
            (f.project_managers, relation_prop(managers)),
        ],
    )
}

/// A page referenced through a manager relation, titled under `field`.
pub fn person(id: &str, field: &str, name: &str) -> Page {
    page(id, vec![(field.to_owned(), title_prop(name))])
}

/// An existing row in the managers table.
pub fn manager_row(id: &str, name: &str) -> Page {
    page(id, vec![(fields().manager_title, title_prop(name))])
}

pub fn block(id: &str, kind: &str, payload: Value) -> Block {
    let mut obj = Map::new();
    obj.insert("object".into(), json!("block"));
    obj.insert("id".into(), json!(id));
    obj.insert("type".into(), json!(kind));
    obj.insert("has_children".into(), json!(false));
    obj.insert("created_time".into(), json!("2024-03-01T10:00:00.000Z"));
    obj.insert(kind.into(), payload);
    serde_json::from_value(Value::Object(obj)).expect("block")
}

pub fn paragraph(id: &str, text: &str) -> Block {
    block(
        id,
        "paragraph",
        json!({ "rich_text": [{ "type": "text", "text": { "content": text }, "plain_text": text }], "color": "default" }),
    )
}

pub fn nested_db_block(id: &str, title: &str) -> Block {
    block(id, "child_database", json!({ "title": title }))
}

/// Schema of the template's nested table: 3 creatable fields, 4 computed.
pub fn template_schema() -> Value {
    let f = fields();
    let (title, status, amount) = (
        f.project_title.as_str(),
        f.project_status.as_str(),
        f.remaining_amount.as_str(),
    );
    json!({
        title: { "id": "title", "name": title, "type": "title", "title": {} },
        status: { "id": "s", "name": status, "type": "select", "select": { "options": [] } },
        amount: { "id": "n", "name": amount, "type": "number", "number": { "format": "number" } },
        "Paid": { "id": "r", "type": "rollup", "rollup": { "function": "sum" } },
        "Progress": { "id": "f", "type": "formula", "formula": { "expression": "1" } },
        "Created": { "id": "c", "type": "created_time", "created_time": {} },
        "Edited": { "id": "e", "type": "last_edited_time", "last_edited_time": {} }
    })
}

/// Seed the three tables plus a template page with mixed content.
pub fn seeded() -> MemoryNotion {
    let api = MemoryNotion::new();
    api.add_database(PROJECTS_DB);
    api.add_database(MANAGERS_DB);
    api.add_schema(TEMPLATE_DB, template_schema());
    api.set_children(
        TEMPLATE_PAGE,
        vec![
            block("t-h", "heading_1", json!({ "rich_text": [], "is_toggleable": false })),
            paragraph("t-p", "Welcome to your workspace"),
            nested_db_block(TEMPLATE_DB, "Template projects"),
            block("t-sync", "synced_block", json!({ "synced_from": { "block_id": "x" } })),
            block("t-page", "child_page", json!({ "title": "Notes" })),
            block("t-unsup", "unsupported", json!({})),
            block("t-todo", "to_do", json!({ "rich_text": [], "checked": false })),
        ],
    );
    api
}
