//! Finding the nested projects table inside a manager page.
//!
//! The table is only ever created while copying the template; a manager page
//! without one is reported, never repaired here.

use pmsync_core::{Block, DatabaseId, NotionApi, PageId};

use crate::error::SyncError;

/// Id of the first nested database in `blocks` titled `title`.
pub fn find_nested_table(blocks: &[Block], title: &str) -> Option<DatabaseId> {
    blocks
        .iter()
        .find(|block| block.nested_database_title() == Some(title))
        .map(|block| DatabaseId::from(block.id.clone()))
}

/// Locate the nested table titled `title` among `manager_page`'s children.
pub fn locate(
    api: &dyn NotionApi,
    manager_page: &PageId,
    title: &str,
) -> Result<DatabaseId, SyncError> {
    let blocks = api
        .list_children(manager_page)
        .map_err(|source| SyncError::ListBlocks {
            page: manager_page.clone(),
            source,
        })?;
    find_nested_table(&blocks, title).ok_or_else(|| SyncError::TableMissing {
        page: manager_page.clone(),
        title: title.to_owned(),
    })
}
