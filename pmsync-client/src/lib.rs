//! # pmsync-client
//!
//! Blocking HTTP implementation of [`pmsync_core::NotionApi`] over the Notion
//! REST API.
//!
//! ```rust,no_run
//! use pmsync_client::{ClientOptions, NotionClient};
//! use pmsync_core::{DatabaseId, NotionApi};
//!
//! let client = NotionClient::new("secret_token", ClientOptions::default());
//! if let Ok(rows) = client.query_database(&DatabaseId::from("db-id"), None) {
//!     println!("{} rows", rows.len());
//! }
//! ```

pub mod append;
pub mod client;
mod wire;

pub use client::{ClientOptions, NotionClient, DEFAULT_API_BASE, NOTION_VERSION};
