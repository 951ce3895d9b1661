//! Manager resolution: relation page → canonical manager page.
//!
//! Managers are keyed by display name. The first time a name is seen in a
//! run the managers table is queried; when no row matches, a new manager
//! page is created and the template is copied into it. Results are cached
//! for the rest of the run.

use std::collections::HashMap;

use pmsync_core::{
    property, FieldNames, Filter, NotionApi, PageId, PropertyWrite, PropertyWrites, SyncConfig,
    SyncStats,
};

use crate::error::SyncError;
use crate::template;

/// Display name of the manager referenced by `relation`.
///
/// The relation page's title is read from each configured title field in
/// turn; the first readable one wins.
pub fn manager_name(
    api: &dyn NotionApi,
    relation: &PageId,
    fields: &FieldNames,
) -> Result<String, SyncError> {
    let page = api
        .retrieve_page(relation)
        .map_err(|source| SyncError::RelationFetch {
            relation: relation.clone(),
            source,
        })?;
    property::first_title(&page, fields.relation_title_fields.iter().map(String::as_str))
        .ok_or_else(|| SyncError::ManagerNameUnreadable {
            relation: relation.clone(),
        })
}

/// Find-or-create for manager pages, with a per-run name → page cache.
pub struct ManagerResolver<'a> {
    api: &'a dyn NotionApi,
    config: &'a SyncConfig,
    cache: HashMap<String, PageId>,
}

impl<'a> ManagerResolver<'a> {
    pub fn new(api: &'a dyn NotionApi, config: &'a SyncConfig) -> Self {
        Self {
            api,
            config,
            cache: HashMap::new(),
        }
    }

    /// Page id of the manager called `name`, creating it when absent.
    ///
    /// A failed lookup is treated as "not found", so a transient error can
    /// produce a duplicate manager row. A failed template copy is logged and
    /// the new page is still returned; without a configured template the page
    /// is created empty.
    pub fn resolve_or_create(
        &mut self,
        name: &str,
        stats: &mut SyncStats,
    ) -> Result<PageId, SyncError> {
        if let Some(id) = self.cache.get(name) {
            tracing::debug!(manager = name, "manager cache hit");
            return Ok(id.clone());
        }

        if let Some(id) = self.lookup(name) {
            tracing::info!(manager = name, page = %id, "found existing manager");
            self.cache.insert(name.to_owned(), id.clone());
            return Ok(id);
        }

        tracing::info!(manager = name, "no matching manager, creating one");
        let id = self.create(name)?;
        self.cache.insert(name.to_owned(), id.clone());
        stats.new_manager_pages += 1;

        let Some(template) = &self.config.template_page else {
            tracing::warn!(
                manager = name,
                "no template page configured, manager page left empty"
            );
            return Ok(id);
        };
        if let Err(err) = template::materialize(
            self.api,
            template,
            &id,
            &self.config.fields.nested_table_title,
        ) {
            tracing::error!(
                manager = name,
                error = %err,
                "manager created without template content"
            );
        }
        Ok(id)
    }

    fn lookup(&self, name: &str) -> Option<PageId> {
        let filter = Filter::title_equals(&self.config.fields.manager_title, name);
        match self
            .api
            .query_database(&self.config.managers_db, Some(&filter))
        {
            Ok(rows) => rows.into_iter().next().map(|row| row.id),
            Err(err) => {
                tracing::error!(manager = name, error = %err, "manager lookup failed");
                None
            }
        }
    }

    fn create(&self, name: &str) -> Result<PageId, SyncError> {
        let mut properties = PropertyWrites::new();
        properties.insert(
            self.config.fields.manager_title.clone(),
            PropertyWrite::Title(name.to_owned()),
        );
        let page = self
            .api
            .create_page(&self.config.managers_db, &properties)
            .map_err(|source| SyncError::ManagerCreate {
                name: name.to_owned(),
                source,
            })?;
        tracing::info!(manager = name, page = %page.id, "created manager page");
        Ok(page.id)
    }
}
