//! Splitting appended children into API requests.
//!
//! Ordinary blocks go through the block-children endpoint in chunks of at
//! most [`MAX_APPEND_BATCH`]. A nested database cannot be created that way;
//! it becomes its own database-create request with the target page as
//! parent. Runs are cut at every nested database so the resulting content
//! order equals the input order.

use std::collections::BTreeMap;

use pmsync_core::{NewBlock, SchemaField};

/// API limit on children per append request.
pub const MAX_APPEND_BATCH: usize = 100;

/// One request needed to materialize a list of descriptors.
#[derive(Debug, PartialEq)]
pub enum AppendStep<'a> {
    Blocks(&'a [NewBlock]),
    Database {
        title: &'a str,
        properties: &'a BTreeMap<String, SchemaField>,
    },
}

/// Plan the requests for `children`, preserving order.
pub fn plan(children: &[NewBlock]) -> Vec<AppendStep<'_>> {
    let mut steps = Vec::new();
    let mut run_start = 0;

    for (i, child) in children.iter().enumerate() {
        if let NewBlock::NestedDatabase { title, properties } = child {
            push_runs(&mut steps, &children[run_start..i]);
            steps.push(AppendStep::Database { title, properties });
            run_start = i + 1;
        }
    }
    push_runs(&mut steps, &children[run_start..]);
    steps
}

fn push_runs<'a>(steps: &mut Vec<AppendStep<'a>>, run: &'a [NewBlock]) {
    for chunk in run.chunks(MAX_APPEND_BATCH) {
        steps.push(AppendStep::Blocks(chunk));
    }
}
