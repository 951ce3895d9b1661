//! Run configuration.
//!
//! [`SyncConfig`] is built once at process start and handed to the engine by
//! reference. The token and both table ids are always required; the template
//! page only when managers may be created. [`FieldNames`] carries the
//! property names of the remote tables and has built-in defaults that an
//! optional YAML file can override.
//!
//! ```text
//! ~/.pmsync/
//!   fields.yaml   (optional field-name mapping)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{DatabaseId, PageId};

/// Property names used in the source, managers and nested tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Project name; title field of both the source table and the nested tables.
    pub project_title: String,
    pub project_status: String,
    pub remaining_amount: String,
    pub project_managers: String,
    /// Title field of the managers table.
    pub manager_title: String,
    /// Title fields tried, in order, on pages referenced by a manager relation.
    pub relation_title_fields: Vec<String>,
    /// Title of the nested table inside every manager page.
    pub nested_table_title: String,
    /// Select field on nested rows recording who last changed the row.
    pub update_source: String,
    /// Label of [`FieldNames::update_source`] meaning "written by this tool".
    pub system_source_label: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            project_title: "اسم المشروع".to_owned(),
            project_status: "حالة المشروع".to_owned(),
            remaining_amount: "المبلغ المتبقي".to_owned(),
            project_managers: "مدير المشروع".to_owned(),
            manager_title: "اسم مدير المشروع".to_owned(),
            relation_title_fields: vec!["Name".to_owned(), "Title".to_owned()],
            nested_table_title: "مشاريعك".to_owned(),
            update_source: "آخر مصدر تحديث".to_owned(),
            system_source_label: "النظام".to_owned(),
        }
    }
}

impl FieldNames {
    /// Load the mapping at `path`; a missing file yields the defaults.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `~/.pmsync/fields.yaml`, when a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| default_path_at(&home))
    }
}

/// `<home>/.pmsync/fields.yaml` — pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".pmsync").join("fields.yaml")
}

/// Everything one sync run needs to know up front.
#[derive(Clone)]
pub struct SyncConfig {
    pub token: String,
    pub projects_db: DatabaseId,
    pub managers_db: DatabaseId,
    /// Copied into new manager pages. Always set by [`SyncConfig::from_settings`].
    pub template_page: Option<PageId>,
    pub fields: FieldNames,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("token", &"<redacted>")
            .field("projects_db", &self.projects_db)
            .field("managers_db", &self.managers_db)
            .field("template_page", &self.template_page)
            .field("fields", &self.fields)
            .finish()
    }
}

impl SyncConfig {
    /// Validate raw settings. Every absent or blank value is reported at once.
    pub fn from_settings(
        token: Option<String>,
        projects_db: Option<String>,
        managers_db: Option<String>,
        template_page: Option<String>,
        fields: FieldNames,
    ) -> Result<Self, ConfigError> {
        Self::build(token, projects_db, managers_db, template_page, true, fields)
    }

    /// Like [`SyncConfig::from_settings`], for passes that never create
    /// managers: a missing template page is not an error.
    pub fn without_template(
        token: Option<String>,
        projects_db: Option<String>,
        managers_db: Option<String>,
        template_page: Option<String>,
        fields: FieldNames,
    ) -> Result<Self, ConfigError> {
        Self::build(token, projects_db, managers_db, template_page, false, fields)
    }

    fn build(
        token: Option<String>,
        projects_db: Option<String>,
        managers_db: Option<String>,
        template_page: Option<String>,
        template_required: bool,
        fields: FieldNames,
    ) -> Result<Self, ConfigError> {
        fn present(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
        }

        let token = present(token);
        let projects_db = present(projects_db);
        let managers_db = present(managers_db);
        let template_page = present(template_page);

        let mut missing = Vec::new();
        if token.is_none() {
            missing.push("NOTION_TOKEN");
        }
        if projects_db.is_none() {
            missing.push("PROJECTS_DB");
        }
        if managers_db.is_none() {
            missing.push("MANAGERS_DB");
        }
        if template_required && template_page.is_none() {
            missing.push("TEMPLATE_PAGE_ID");
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing { keys: missing });
        }

        match (token, projects_db, managers_db) {
            (Some(token), Some(projects_db), Some(managers_db)) => Ok(Self {
                token,
                projects_db: DatabaseId(projects_db),
                managers_db: DatabaseId(managers_db),
                template_page: template_page.map(PageId),
                fields,
            }),
            _ => Err(ConfigError::Missing { keys: missing }),
        }
    }
}
