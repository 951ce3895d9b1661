//! Subcommands and the connection settings they share.

pub mod push;
pub mod reconcile;
pub mod sync;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use pmsync_client::{ClientOptions, NotionClient, DEFAULT_API_BASE};
use pmsync_core::{FieldNames, SyncConfig};

/// Workspace identifiers, credentials and API tuning.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Notion integration token.
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Id of the source projects database.
    #[arg(long, env = "PROJECTS_DB")]
    pub projects_db: Option<String>,

    /// Id of the managers database.
    #[arg(long, env = "MANAGERS_DB")]
    pub managers_db: Option<String>,

    /// Id of the page copied into every new manager page. Only `sync` needs it.
    #[arg(long = "template-page", env = "TEMPLATE_PAGE_ID")]
    pub template_page: Option<String>,

    /// Field mapping file (default: ~/.pmsync/fields.yaml).
    #[arg(long, value_name = "PATH")]
    pub fields: Option<PathBuf>,

    /// Base URL of the Notion REST API.
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ConnectionArgs {
    /// Resolve field names and required settings into a [`SyncConfig`].
    pub fn config(&self) -> Result<SyncConfig> {
        let fields = self.field_names()?;
        SyncConfig::from_settings(
            self.token.clone(),
            self.projects_db.clone(),
            self.managers_db.clone(),
            self.template_page.clone(),
            fields,
        )
        .context("incomplete configuration")
    }

    /// Like [`ConnectionArgs::config`] for commands that never create manager
    /// pages, so `TEMPLATE_PAGE_ID` may be absent.
    pub fn config_without_template(&self) -> Result<SyncConfig> {
        let fields = self.field_names()?;
        SyncConfig::without_template(
            self.token.clone(),
            self.projects_db.clone(),
            self.managers_db.clone(),
            self.template_page.clone(),
            fields,
        )
        .context("incomplete configuration")
    }

    pub fn client(&self, config: &SyncConfig) -> NotionClient {
        NotionClient::new(
            config.token.clone(),
            ClientOptions {
                api_base: self.api_base.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            },
        )
    }

    fn field_names(&self) -> Result<FieldNames> {
        let path = match &self.fields {
            Some(path) => {
                if !path.exists() {
                    bail!("field mapping file {} does not exist", path.display());
                }
                path.clone()
            }
            None => FieldNames::default_path().context("could not determine home directory")?,
        };
        let fields = FieldNames::load_at(&path)?;
        tracing::debug!(path = %path.display(), "field names loaded");
        Ok(fields)
    }
}
