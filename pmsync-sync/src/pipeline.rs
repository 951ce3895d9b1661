//! Sync orchestration.
//!
//! One pass, no retries:
//!
//! 1. Fetch every source project (failure ends the run).
//! 2. Per project: read name, status, remaining amount and manager relation.
//!    A project missing any of them is skipped and counted as one error.
//! 3. Per manager relation: read the manager's name, resolve or create the
//!    manager page, locate its nested table, upsert the project row. Any
//!    failure is counted and the next relation is processed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pmsync_core::{
    property, FieldNames, NotionApi, Page, PageId, ProjectData, SyncConfig, SyncStats,
};

use crate::error::SyncError;
use crate::locator;
use crate::managers::{self, ManagerResolver};
use crate::upsert::{self, UpsertOutcome};

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub projects: usize,
    pub stats: SyncStats,
}

impl SyncReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// A project that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProject {
    pub data: ProjectData,
    pub managers: Vec<PageId>,
}

/// Read the four required fields of a source project.
pub fn extract_project(page: &Page, fields: &FieldNames) -> Result<ValidProject, SyncError> {
    let name = property::title(page, &fields.project_title);
    let status = property::select(page, &fields.project_status);
    let amount = property::formula_number(page, &fields.remaining_amount);
    let managers =
        property::relation(page, &fields.project_managers).filter(|ids| !ids.is_empty());

    match (name, status, amount, managers) {
        (Some(name), Some(status), Some(remaining_amount), Some(managers)) => Ok(ValidProject {
            data: ProjectData {
                name,
                status,
                remaining_amount,
            },
            managers,
        }),
        (name, status, amount, managers) => {
            let missing = [
                ("name", name.is_none()),
                ("status", status.is_none()),
                ("remaining amount", amount.is_none()),
                ("manager", managers.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();
            Err(SyncError::MissingFields {
                page: page.id.clone(),
                missing,
            })
        }
    }
}

/// State of one sync run: the manager cache and the counters.
pub struct Syncer<'a> {
    api: &'a dyn NotionApi,
    config: &'a SyncConfig,
    managers: ManagerResolver<'a>,
    stats: SyncStats,
}

impl<'a> Syncer<'a> {
    pub fn new(api: &'a dyn NotionApi, config: &'a SyncConfig) -> Self {
        Self {
            api,
            config,
            managers: ManagerResolver::new(api, config),
            stats: SyncStats::default(),
        }
    }

    /// Run the whole pass and return the final counters.
    pub fn run(mut self) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        tracing::info!(source = %self.config.projects_db, "starting project sync");

        let projects = self
            .api
            .query_database(&self.config.projects_db, None)
            .map_err(|source| SyncError::ProjectFetch {
                database: self.config.projects_db.clone(),
                source,
            })?;
        tracing::info!(count = projects.len(), "fetched projects");

        for page in &projects {
            if let Err(err) = self.process_project(page) {
                tracing::warn!(project = %page.id, error = %err, "skipping project");
                self.stats.errors += 1;
            }
        }

        tracing::info!(
            processed = self.stats.processed,
            added = self.stats.added,
            updated = self.stats.updated,
            new_manager_pages = self.stats.new_manager_pages,
            errors = self.stats.errors,
            "sync finished",
        );

        Ok(SyncReport {
            started_at,
            finished_at: Utc::now(),
            projects: projects.len(),
            stats: self.stats,
        })
    }

    /// Mirror one project into all of its managers' tables.
    ///
    /// Returns `Err` only when the project itself is unusable; per-manager
    /// failures are counted here and do not fail the project.
    pub fn process_project(&mut self, page: &Page) -> Result<(), SyncError> {
        self.stats.processed += 1;
        let project = extract_project(page, &self.config.fields)?;
        tracing::info!(project = %project.data.name, "processing project");

        for relation in &project.managers {
            if let Err(err) = self.process_relation(&project.data, relation) {
                tracing::error!(
                    project = %project.data.name,
                    relation = %relation,
                    error = %err,
                    "manager relation failed"
                );
                self.stats.errors += 1;
            }
        }
        Ok(())
    }

    fn process_relation(&mut self, data: &ProjectData, relation: &PageId) -> Result<(), SyncError> {
        let config = self.config;
        let fields = &config.fields;
        let name = managers::manager_name(self.api, relation, fields)?;
        let manager_page = self.managers.resolve_or_create(&name, &mut self.stats)?;
        let table = locator::locate(self.api, &manager_page, &fields.nested_table_title)?;

        match upsert::upsert(self.api, &table, data, fields)? {
            UpsertOutcome::Added(_) => self.stats.added += 1,
            UpsertOutcome::Updated(_) => self.stats.updated += 1,
        }
        Ok(())
    }
}

/// Run one sync pass with `config` against `api`.
pub fn run(api: &dyn NotionApi, config: &SyncConfig) -> Result<SyncReport, SyncError> {
    Syncer::new(api, config).run()
}
