//! Name-keyed upsert of project rows into a manager's nested table.
//!
//! Rows are matched on the project name alone. Two source projects sharing a
//! name end up in one row, and a renamed project leaves its old row behind.

use pmsync_core::{
    ApiError, DatabaseId, FieldNames, Filter, NotionApi, PageId, ProjectData, PropertyWrite,
    PropertyWrites,
};

use crate::error::SyncError;

/// What [`upsert`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added(PageId),
    Updated(PageId),
}

/// Row properties mirrored from `data`.
pub fn row_properties(data: &ProjectData, fields: &FieldNames) -> PropertyWrites {
    let mut props = PropertyWrites::new();
    props.insert(
        fields.project_title.clone(),
        PropertyWrite::Title(data.name.clone()),
    );
    props.insert(
        fields.project_status.clone(),
        PropertyWrite::Select(data.status.clone()),
    );
    props.insert(
        fields.remaining_amount.clone(),
        PropertyWrite::Number(data.remaining_amount),
    );
    props
}

/// Update the row named `data.name` in `table`, or create it.
///
/// Issues one query and exactly one write.
pub fn upsert(
    api: &dyn NotionApi,
    table: &DatabaseId,
    data: &ProjectData,
    fields: &FieldNames,
) -> Result<UpsertOutcome, SyncError> {
    let upsert_err = |source: ApiError| SyncError::Upsert {
        project: data.name.clone(),
        table: table.clone(),
        source,
    };

    let filter = Filter::title_equals(&fields.project_title, &data.name);
    let existing = api
        .query_database(table, Some(&filter))
        .map_err(upsert_err)?;
    let props = row_properties(data, fields);

    match existing.into_iter().next() {
        Some(row) => {
            api.update_page(&row.id, &props).map_err(upsert_err)?;
            tracing::info!(project = %data.name, table = %table, "updated project row");
            Ok(UpsertOutcome::Updated(row.id))
        }
        None => {
            let row = api.create_page(table, &props).map_err(upsert_err)?;
            tracing::info!(project = %data.name, table = %table, "added project row");
            Ok(UpsertOutcome::Added(row.id))
        }
    }
}
