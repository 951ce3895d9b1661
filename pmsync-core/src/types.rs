//! Domain types shared by the sync engine.
//!
//! Remote identifiers are opaque strings; the newtypes only keep page,
//! database and block ids from being mixed up at call sites.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a page (a database row is a page too).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub String);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a database (a "data table").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatabaseId(pub String);

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DatabaseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DatabaseId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a content block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A nested-database block shares its id with the database it embeds.
impl From<BlockId> for DatabaseId {
    fn from(b: BlockId) -> Self {
        Self(b.0)
    }
}

// ---------------------------------------------------------------------------
// Project data
// ---------------------------------------------------------------------------

/// The mirrored fields of a source project, all present by construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectData {
    pub name: String,
    pub status: String,
    pub remaining_amount: f64,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Counters for one sync run. Owned by the run and dropped with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub processed: usize,
    pub added: usize,
    pub updated: usize,
    pub new_manager_pages: usize,
    pub errors: usize,
}

/// Counters for one reconcile run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub managers: usize,
    pub rows_checked: usize,
    pub reconciled: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Counters for one status-push run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushStats {
    pub managers: usize,
    pub rows_checked: usize,
    /// Source projects whose status was overwritten from a manager row.
    pub pushed: usize,
    pub subtables_created: usize,
    pub skipped: usize,
    pub errors: usize,
}
