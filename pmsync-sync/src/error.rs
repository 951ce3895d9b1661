//! Error types for pmsync-sync.

use thiserror::Error;

use pmsync_core::{ApiError, DatabaseId, PageId};

/// Failures of individual sync stages.
///
/// Only [`SyncError::ProjectFetch`] and [`SyncError::ManagerFetch`] end a
/// run; everything else is counted and the run moves on.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The initial project listing failed.
    #[error("failed to fetch projects from {database}: {source}")]
    ProjectFetch {
        database: DatabaseId,
        #[source]
        source: ApiError,
    },

    /// The managers listing for reconciliation or status push failed.
    #[error("failed to fetch managers from {database}: {source}")]
    ManagerFetch {
        database: DatabaseId,
        #[source]
        source: ApiError,
    },

    /// A project lacks one of the fields needed to mirror it.
    #[error("project {page} is missing required fields: {}", missing.join(", "))]
    MissingFields {
        page: PageId,
        missing: Vec<&'static str>,
    },

    #[error("failed to retrieve manager relation {relation}: {source}")]
    RelationFetch {
        relation: PageId,
        #[source]
        source: ApiError,
    },

    #[error("manager relation {relation} has no readable title")]
    ManagerNameUnreadable { relation: PageId },

    #[error("failed to create manager page for '{name}': {source}")]
    ManagerCreate {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to list blocks of page {page}: {source}")]
    ListBlocks {
        page: PageId,
        #[source]
        source: ApiError,
    },

    /// The manager page has no nested table with the expected title.
    #[error("nested table '{title}' not found in manager page {page}")]
    TableMissing { page: PageId, title: String },

    #[error("failed to upsert project '{project}' into {table}: {source}")]
    Upsert {
        project: String,
        table: DatabaseId,
        #[source]
        source: ApiError,
    },

    #[error("failed to copy template {template} into {page}: {source}")]
    Template {
        template: PageId,
        page: PageId,
        #[source]
        source: ApiError,
    },

    #[error("failed to create sub-databases under project row {page}: {source}")]
    Subtables {
        page: PageId,
        #[source]
        source: ApiError,
    },

    #[error("failed to query {table}: {source}")]
    Query {
        table: DatabaseId,
        #[source]
        source: ApiError,
    },

    #[error("failed to update row {page}: {source}")]
    RowUpdate {
        page: PageId,
        #[source]
        source: ApiError,
    },
}
