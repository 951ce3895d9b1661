//! Status reconciliation.
//!
//! Walks every manager's nested table and, for rows last written by this
//! tool, forces the status back to the source project's status. Rows edited
//! by a manager (any other update-source label) are left alone.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pmsync_core::{
    property, DatabaseId, Filter, NotionApi, Page, PropertyWrite, PropertyWrites, ReconcileStats,
    SyncConfig,
};

use crate::error::SyncError;
use crate::locator;

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: ReconcileStats,
}

impl ReconcileReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// What happened to a single nested row.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowOutcome {
    Reconciled,
    InSync,
    Skipped(&'static str),
}

struct Reconciler<'a> {
    api: &'a dyn NotionApi,
    config: &'a SyncConfig,
    stats: ReconcileStats,
}

impl<'a> Reconciler<'a> {
    fn source_status(&self, project_name: &str) -> Result<Option<String>, SyncError> {
        let fields = &self.config.fields;
        let filter = Filter::title_equals(&fields.project_title, project_name);
        let rows = self
            .api
            .query_database(&self.config.projects_db, Some(&filter))
            .map_err(|source| SyncError::Query {
                table: self.config.projects_db.clone(),
                source,
            })?;
        Ok(rows
            .first()
            .and_then(|row| property::select(row, &fields.project_status)))
    }

    fn reconcile_row(&self, row: &Page) -> Result<RowOutcome, SyncError> {
        let fields = &self.config.fields;
        let Some(name) = property::title(row, &fields.project_title) else {
            return Ok(RowOutcome::Skipped("no project name"));
        };
        let source_label = property::select(row, &fields.update_source);
        if source_label.as_deref() != Some(fields.system_source_label.as_str()) {
            return Ok(RowOutcome::Skipped("last edited outside sync"));
        }
        let Some(source_status) = self.source_status(&name)? else {
            return Ok(RowOutcome::Skipped("no source project"));
        };

        let current = property::select(row, &fields.project_status);
        if current.as_deref() == Some(source_status.as_str()) {
            return Ok(RowOutcome::InSync);
        }

        let mut props = PropertyWrites::new();
        props.insert(
            fields.project_status.clone(),
            PropertyWrite::Select(source_status.clone()),
        );
        props.insert(
            fields.update_source.clone(),
            PropertyWrite::Select(fields.system_source_label.clone()),
        );
        self.api
            .update_page(&row.id, &props)
            .map_err(|source| SyncError::RowUpdate {
                page: row.id.clone(),
                source,
            })?;
        tracing::info!(
            project = %name,
            from = current.as_deref().unwrap_or("-"),
            to = %source_status,
            "reconciled row status"
        );
        Ok(RowOutcome::Reconciled)
    }

    fn reconcile_table(&mut self, table: &DatabaseId) -> Result<(), SyncError> {
        let rows = self
            .api
            .query_database(table, None)
            .map_err(|source| SyncError::Query {
                table: table.clone(),
                source,
            })?;

        for row in &rows {
            self.stats.rows_checked += 1;
            match self.reconcile_row(row) {
                Ok(RowOutcome::Reconciled) => self.stats.reconciled += 1,
                Ok(RowOutcome::InSync) => {}
                Ok(RowOutcome::Skipped(reason)) => {
                    tracing::debug!(row = %row.id, reason, "row skipped");
                    self.stats.skipped += 1;
                }
                Err(err) => {
                    tracing::error!(
                        row = %row.id,
                        error = %err,
                        "row reconciliation failed"
                    );
                    self.stats.errors += 1;
                }
            }
        }
        Ok(())
    }

    fn reconcile_manager(&mut self, manager: &Page) {
        self.stats.managers += 1;
        let config = self.config;
        let title = &config.fields.nested_table_title;
        match locator::locate(self.api, &manager.id, title) {
            Ok(table) => {
                if let Err(err) = self.reconcile_table(&table) {
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

/// Reconcile every manager's nested table against the source projects.
pub fn run(api: &dyn NotionApi, config: &SyncConfig) -> Result<ReconcileReport, SyncError> {
    let started_at = Utc::now();
    tracing::info!("starting status reconciliation");

    let managers = api
        .query_database(&config.managers_db, None)
        .map_err(|source| SyncError::ManagerFetch {
            database: config.managers_db.clone(),
            source,
        })?;

    let mut reconciler = Reconciler {
        api,
        config,
        stats: ReconcileStats::default(),
    };
    for manager in &managers {
        reconciler.reconcile_manager(manager);
    }

    let stats = reconciler.stats;
    tracing::info!(
        managers = stats.managers,
        rows_checked = stats.rows_checked,
        reconciled = stats.reconciled,
        skipped = stats.skipped,
        errors = stats.errors,
        "reconciliation finished",
    );
    Ok(ReconcileReport {
        started_at,
        finished_at: Utc::now(),
        stats,
    })
}
