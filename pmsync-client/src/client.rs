//! `ureq`-backed [`NotionApi`] implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use pmsync_core::{
    api::writes_to_json,
    model::text_content,
    ApiError, Block, DatabaseId, DatabaseSchema, Filter, NewBlock, NotionApi, Page, PageId,
    PropertyWrites, SchemaField,
};

use crate::append::{self, AppendStep};
use crate::wire::{status_error, ListResponse};

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

const PAGE_SIZE: usize = 100;

/// Connection settings for [`NotionClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking client for the Notion REST API.
pub struct NotionClient {
    agent: ureq::Agent,
    api_base: String,
    token: String,
}

impl NotionClient {
    pub fn new(token: impl Into<String>, options: ClientOptions) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(options.timeout)
            .user_agent(concat!("pmsync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            api_base: options.api_base.trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Issue one request and parse the JSON response body.
    fn send(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let endpoint = format!("{method} /{path}");
        tracing::debug!(endpoint = %endpoint, "request");

        let mut request = self
            .agent
            .request(method, &self.url(path))
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Notion-Version", NOTION_VERSION);
        for (key, value) in query {
            request = request.query(key, value);
        }

        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(response) => {
                let text = response.into_string().map_err(|e| ApiError::Transport {
                    endpoint: endpoint.clone(),
                    message: e.to_string(),
                })?;
                serde_json::from_str(&text).map_err(|source| ApiError::Decode { endpoint, source })
            }
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(status_error(endpoint, status, &text))
            }
            Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport {
                endpoint,
                message: transport.to_string(),
            }),
        }
    }

    fn send_as<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let value = self.send(method, path, query, body)?;
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            endpoint: format!("{method} /{path}"),
            source,
        })
    }

    /// Follow `next_cursor` until the list is exhausted.
    fn collect_all<T, F>(&self, mut fetch: F) -> Result<Vec<T>, ApiError>
    where
        F: FnMut(Option<&str>) -> Result<ListResponse<T>, ApiError>,
    {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = fetch(cursor.as_deref())?;
            items.extend(page.results);
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(items)
    }

    fn create_inline_database(
        &self,
        parent: &PageId,
        title: &str,
        properties: &BTreeMap<String, SchemaField>,
    ) -> Result<(), ApiError> {
        let body = json!({
            "parent": { "type": "page_id", "page_id": parent.0 },
            "is_inline": true,
            "title": text_content(title),
            "properties": properties,
        });
        self.send("POST", "databases", &[], Some(&body))?;
        tracing::info!(title, page = %parent, "created inline database");
        Ok(())
    }
}

impl NotionApi for NotionClient {
    fn query_database(
        &self,
        database: &DatabaseId,
        filter: Option<&Filter>,
    ) -> Result<Vec<Page>, ApiError> {
        let path = format!("databases/{}/query", database.0);
        self.collect_all(|cursor| {
            let mut body = Map::new();
            body.insert("page_size".to_owned(), json!(PAGE_SIZE));
            if let Some(cursor) = cursor {
                body.insert("start_cursor".to_owned(), json!(cursor));
            }
            if let Some(filter) = filter {
                body.insert("filter".to_owned(), filter.to_json());
            }
            self.send_as("POST", &path, &[], Some(&Value::Object(body)))
        })
    }

    fn retrieve_page(&self, page: &PageId) -> Result<Page, ApiError> {
        self.send_as("GET", &format!("pages/{}", page.0), &[], None)
    }

    fn create_page(
        &self,
        parent: &DatabaseId,
        properties: &PropertyWrites,
    ) -> Result<Page, ApiError> {
        let body = json!({
            "parent": { "database_id": parent.0 },
            "properties": writes_to_json(properties),
        });
        self.send_as("POST", "pages", &[], Some(&body))
    }

    fn update_page(&self, page: &PageId, properties: &PropertyWrites) -> Result<Page, ApiError> {
        let body = json!({ "properties": writes_to_json(properties) });
        self.send_as("PATCH", &format!("pages/{}", page.0), &[], Some(&body))
    }

    fn list_children(&self, page: &PageId) -> Result<Vec<Block>, ApiError> {
        let path = format!("blocks/{}/children", page.0);
        let page_size = PAGE_SIZE.to_string();
        self.collect_all(|cursor| {
            let mut query = vec![("page_size", page_size.as_str())];
            if let Some(cursor) = cursor {
                query.push(("start_cursor", cursor));
            }
            self.send_as("GET", &path, &query, None)
        })
    }

    fn append_children(&self, page: &PageId, children: &[NewBlock]) -> Result<(), ApiError> {
        let path = format!("blocks/{}/children", page.0);
        for step in append::plan(children) {
            match step {
                AppendStep::Blocks(batch) => {
                    let body = json!({
                        "children": batch.iter().map(NewBlock::to_json).collect::<Vec<_>>(),
                    });
                    self.send("PATCH", &path, &[], Some(&body))?;
                }
                AppendStep::Database { title, properties } => {
                    self.create_inline_database(page, title, properties)?;
                }
            }
        }
        Ok(())
    }

    fn retrieve_database(&self, database: &DatabaseId) -> Result<DatabaseSchema, ApiError> {
        self.send_as("GET", &format!("databases/{}", database.0), &[], None)
    }
}
