//! # pmsync-sync
//!
//! Project → manager workspace synchronization.
//!
//! Call [`pipeline::run`] to mirror every source project into the nested
//! table of each of its managers, creating manager pages from the template
//! on first sight. [`reconcile::run`] pushes source statuses back onto rows
//! last written by this tool, and [`push::run`] carries statuses edited by
//! managers the other way, into the source projects.

pub mod error;
pub mod locator;
pub mod managers;
pub mod pipeline;
pub mod push;
pub mod reconcile;
pub mod subtables;
pub mod template;
pub mod upsert;

pub use error::SyncError;
pub use managers::ManagerResolver;
pub use pipeline::{SyncReport, Syncer};
pub use push::PushReport;
pub use reconcile::ReconcileReport;
pub use upsert::UpsertOutcome;
