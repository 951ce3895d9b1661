//! Status push from manager workspaces back to the source projects.
//!
//! Walks every manager's nested table. For each named row it first makes
//! sure the project sub-databases exist under the row, then copies the row's
//! status onto the source project with the same name when the two differ.
//! Isolation matches reconciliation: a failing row or manager is counted and
//! the walk moves on.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pmsync_core::{
    property, DatabaseId, Filter, NotionApi, Page, PropertyWrite, PropertyWrites, PushStats,
    SyncConfig,
};

use crate::error::SyncError;
use crate::locator;
use crate::subtables::{self, Subtable};

#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: PushStats,
}

impl PushReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StatusOutcome {
    Pushed,
    InSync,
    Skipped(&'static str),
}

struct Pusher<'a> {
    api: &'a dyn NotionApi,
    config: &'a SyncConfig,
    subtables: Vec<Subtable>,
    stats: PushStats,
}

impl<'a> Pusher<'a> {
    fn push_status(&self, row: &Page, name: &str) -> Result<StatusOutcome, SyncError> {
        let fields = &self.config.fields;
        let Some(status) = property::select(row, &fields.project_status) else {
            return Ok(StatusOutcome::Skipped("no status"));
        };

        let filter = Filter::title_equals(&fields.project_title, name);
        let sources = self
            .api
            .query_database(&self.config.projects_db, Some(&filter))
            .map_err(|source| SyncError::Query {
                table: self.config.projects_db.clone(),
                source,
            })?;
        let Some(project) = sources.first() else {
            return Ok(StatusOutcome::Skipped("no source project"));
        };

        let current = property::select(project, &fields.project_status);
        if current.as_deref() == Some(status.as_str()) {
            return Ok(StatusOutcome::InSync);
        }

        let mut props = PropertyWrites::new();
        props.insert(
            fields.project_status.clone(),
            PropertyWrite::Select(status.clone()),
        );
        self.api
            .update_page(&project.id, &props)
            .map_err(|source| SyncError::RowUpdate {
                page: project.id.clone(),
                source,
            })?;
        tracing::info!(
            project = %name,
            from = current.as_deref().unwrap_or("-"),
            to = %status,
            "pushed status to source project"
        );
        Ok(StatusOutcome::Pushed)
    }

    fn process_row(&mut self, row: &Page) {
        self.stats.rows_checked += 1;
        let Some(name) = property::title(row, &self.config.fields.project_title) else {
            tracing::debug!(row = %row.id, "row has no project name, skipping");
            self.stats.skipped += 1;
            return;
        };

        if !self.subtables.is_empty() {
            match subtables::ensure(self.api, &row.id, &self.subtables) {
                Ok(created) => self.stats.subtables_created += created,
                Err(err) => {
                    tracing::error!(row = %row.id, error = %err, "sub-database setup failed");
                    self.stats.errors += 1;
                }
            }
        }

        match self.push_status(row, &name) {
            Ok(StatusOutcome::Pushed) => self.stats.pushed += 1,
            Ok(StatusOutcome::InSync) => {}
            Ok(StatusOutcome::Skipped(reason)) => {
                tracing::debug!(row = %row.id, reason, "status not pushed");
                self.stats.skipped += 1;
            }
            Err(err) => {
                tracing::error!(row = %row.id, error = %err, "status push failed");
                self.stats.errors += 1;
            }
        }
    }

    fn push_table(&mut self, table: &DatabaseId) -> Result<(), SyncError> {
        let rows = self
            .api
            .query_database(table, None)
            .map_err(|source| SyncError::Query {
                table: table.clone(),
                source,
            })?;
        for row in &rows {
            self.process_row(row);
        }
        Ok(())
    }

    fn push_manager(&mut self, manager: &Page) {
        self.stats.managers += 1;
        let config = self.config;
        let title = &config.fields.nested_table_title;
        match locator::locate(self.api, &manager.id, title) {
            Ok(table) => {
                if let Err(err) = self.push_table(&table) {
                    tracing::error!(
                        manager = %manager.id,
                        error = %err,
                        "manager table unreadable"
                    );
                    self.stats.errors += 1;
                }
            }
            Err(SyncError::TableMissing { .. }) => {
                tracing::warn!(
                    manager = %manager.id,
                    table = %title,
                    "nested table missing, skipping"
                );
                self.stats.skipped += 1;
            }
            Err(err) => {
                tracing::error!(manager = %manager.id, error = %err, "manager page unreadable");
                self.stats.errors += 1;
            }
        }
    }
}

/// Push manager-edited statuses to the source projects.
///
/// With `with_subtables`, missing project sub-databases are created under
/// every named row on the way.
pub fn run(
    api: &dyn NotionApi,
    config: &SyncConfig,
    with_subtables: bool,
) -> Result<PushReport, SyncError> {
    let started_at = Utc::now();
    tracing::info!(with_subtables, "starting status push");

    let managers = api
        .query_database(&config.managers_db, None)
        .map_err(|source| SyncError::ManagerFetch {
            database: config.managers_db.clone(),
            source,
        })?;

    let mut pusher = Pusher {
        api,
        config,
        subtables: if with_subtables {
            subtables::project_subtables()
        } else {
            Vec::new()
        },
        stats: PushStats::default(),
    };
    for manager in &managers {
        pusher.push_manager(manager);
    }

    let stats = pusher.stats;
    tracing::info!(
        managers = stats.managers,
        rows_checked = stats.rows_checked,
        pushed = stats.pushed,
        subtables_created = stats.subtables_created,
        skipped = stats.skipped,
        errors = stats.errors,
        "status push finished",
    );
    Ok(PushReport {
        started_at,
        finished_at: Utc::now(),
        stats,
    })
}
