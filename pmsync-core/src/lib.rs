//! pmsync core library — record model, property access, configuration, errors.
//!
//! Public API surface:
//! - [`types`] — id newtypes, project data, run statistics
//! - [`model`] — pages, blocks, database schemas and block descriptors
//! - [`property`] — typed reads out of page properties
//! - [`config`] — [`SyncConfig`] and the field-name mapping
//! - [`api`] — the [`NotionApi`] capability trait
//! - [`error`] — [`ApiError`], [`ConfigError`], [`PropertyError`]

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod property;
pub mod types;

pub use api::{Filter, NotionApi, PropertyWrite, PropertyWrites};
pub use config::{FieldNames, SyncConfig};
pub use error::{ApiError, ConfigError, PropertyError};
pub use model::{Block, BlockKind, DatabaseSchema, NewBlock, Page, RichText, SchemaField};
pub use types::{BlockId, DatabaseId, PageId, ProjectData, PushStats, ReconcileStats, SyncStats};
