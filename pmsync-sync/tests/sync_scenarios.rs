//! End-to-end sync runs against the in-memory API.

mod support;

use pmsync_core::{property, SyncStats};
use pmsync_sync::{pipeline, SyncError};

use support::*;

/// Id of the nested table created inside `manager_page`.
fn nested_table(api: &MemoryNotion, manager_page: &str) -> String {
    let blocks = api.children(manager_page);
    pmsync_sync::locator::find_nested_table(&blocks, &fields().nested_table_title)
        .expect("nested table")
        .0
}

fn alice_setup() -> MemoryNotion {
    let api = seeded();
    api.add_page(person("rel-alice", "Name", "Alice"));
    api.add_row(
        PROJECTS_DB,
        project("proj-1", "Site Redesign", "Active", 1200.0, &["rel-alice"]),
    );
    api
}

#[test]
fn first_run_creates_manager_workspace_and_row() {
    let api = alice_setup();
    let cfg = config();

    let report = pipeline::run(&api, &cfg).expect("run");
    assert_eq!(
        report.stats,
        SyncStats {
            processed: 1,
            added: 1,
            updated: 0,
            new_manager_pages: 1,
            errors: 0,
        }
    );
    assert_eq!(report.projects, 1);

    let managers = api.rows(MANAGERS_DB);
    assert_eq!(managers.len(), 1);
    assert_eq!(
        property::title(&managers[0], &fields().manager_title).as_deref(),
        Some("Alice")
    );

    let table = nested_table(&api, &managers[0].id.0);
    let rows = api.rows(&table);
    assert_eq!(rows.len(), 1);
    let f = fields();
    assert_eq!(
        property::title(&rows[0], &f.project_title).as_deref(),
        Some("Site Redesign")
    );
    assert_eq!(
        property::select(&rows[0], &f.project_status).as_deref(),
        Some("Active")
    );
    assert_eq!(rows[0].properties[&f.remaining_amount]["number"], 1200.0);
}

#[test]
fn second_run_updates_instead_of_adding() {
    let api = alice_setup();
    let cfg = config();
    pipeline::run(&api, &cfg).expect("first run");

    let report = pipeline::run(&api, &cfg).expect("second run");
    assert_eq!(
        report.stats,
        SyncStats {
            processed: 1,
            added: 0,
            updated: 1,
            new_manager_pages: 0,
            errors: 0,
        }
    );

    let managers = api.rows(MANAGERS_DB);
    assert_eq!(managers.len(), 1, "no duplicate manager page");
    let table = nested_table(&api, &managers[0].id.0);
    assert_eq!(api.rows(&table).len(), 1);
}

#[test]
fn changed_source_values_are_written_on_update() {
    let api = alice_setup();
    let cfg = config();
    pipeline::run(&api, &cfg).expect("first run");

    api.add_row(
        PROJECTS_DB,
        project("proj-1b", "Site Redesign", "Done", 0.0, &["rel-alice"]),
    );
    let report = pipeline::run(&api, &cfg).expect("second run");
    assert_eq!(report.stats.updated, 2);

    let managers = api.rows(MANAGERS_DB);
    let table = nested_table(&api, &managers[0].id.0);
    let rows = api.rows(&table);
    assert_eq!(rows.len(), 1);
    let f = fields();
    assert_eq!(
        property::select(&rows[0], &f.project_status).as_deref(),
        Some("Done")
    );
    assert_eq!(rows[0].properties[&f.remaining_amount]["number"], 0.0);
}

#[test]
fn incomplete_project_is_skipped_without_manager_calls() {
    let api = seeded();
    let f = fields();
    api.add_row(
        PROJECTS_DB,
        page(
            "proj-x",
            vec![
                (f.project_title.clone(), title_prop("No Status")),
                (f.remaining_amount.clone(), amount_prop(10.0)),
                (f.project_managers.clone(), relation_prop(&["rel-alice"])),
            ],
        ),
    );

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.processed, 1);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(api.calls(), vec![Call::Query(PROJECTS_DB.into())]);
}

#[test]
fn project_without_managers_is_skipped() {
    let api = seeded();
    api.add_row(
        PROJECTS_DB,
        project("proj-1", "Orphan", "Active", 5.0, &[]),
    );
    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.errors, 1);
    assert_eq!(api.calls().len(), 1);
}

#[test]
fn malformed_required_field_counts_as_missing() {
    let api = seeded();
    let f = fields();
    api.add_row(
        PROJECTS_DB,
        page(
            "proj-bad",
            vec![
                (f.project_title.clone(), title_prop("Broken")),
                (f.project_status.clone(), select_prop("Active")),
                (
                    f.remaining_amount.clone(),
                    serde_json::json!({ "type": "formula", "formula": { "type": "string", "string": "n/a" } }),
                ),
                (f.project_managers.clone(), relation_prop(&["rel-alice"])),
            ],
        ),
    );
    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.added, 0);
}

#[test]
fn repeated_manager_is_looked_up_and_created_once() {
    let api = seeded();
    api.add_page(person("rel-alice", "Name", "Alice"));
    api.add_page(person("rel-alice-2", "Title", "Alice"));
    api.add_row(PROJECTS_DB, project("p1", "One", "Active", 1.0, &["rel-alice"]));
    api.add_row(PROJECTS_DB, project("p2", "Two", "Active", 2.0, &["rel-alice-2"]));
    api.add_row(PROJECTS_DB, project("p3", "Three", "Paused", 3.0, &["rel-alice"]));

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.added, 3);
    assert_eq!(report.stats.new_manager_pages, 1);
    assert_eq!(report.stats.errors, 0);
    assert_eq!(api.count(&Call::Query(MANAGERS_DB.into())), 1);
    assert_eq!(api.count(&Call::CreatePage(MANAGERS_DB.into())), 1);
    assert_eq!(api.count(&Call::ListChildren(TEMPLATE_PAGE.into())), 1);
}

#[test]
fn existing_manager_is_reused_without_template_copy() {
    let api = seeded();
    api.add_page(person("rel-bob", "Name", "Bob"));
    api.add_row(MANAGERS_DB, manager_row("mgr-bob", "Bob"));
    api.add_database("bob-projects");
    api.set_children(
        "mgr-bob",
        vec![
            paragraph("b-1", "Bob's notes"),
            nested_db_block("bob-projects", &fields().nested_table_title),
        ],
    );
    api.add_row(PROJECTS_DB, project("p1", "Launch", "Active", 50.0, &["rel-bob"]));

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.new_manager_pages, 0);
    assert_eq!(report.stats.added, 1);
    assert_eq!(api.rows("bob-projects").len(), 1);
    assert_eq!(api.count(&Call::ListChildren(TEMPLATE_PAGE.into())), 0);
    assert_eq!(api.count(&Call::CreatePage(MANAGERS_DB.into())), 0);
}

#[test]
fn manager_lookup_is_case_sensitive() {
    let api = seeded();
    api.add_page(person("rel-alice", "Name", "Alice"));
    api.add_row(MANAGERS_DB, manager_row("mgr-lower", "alice"));
    api.add_row(PROJECTS_DB, project("p1", "One", "Active", 1.0, &["rel-alice"]));

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.new_manager_pages, 1);
    assert_eq!(api.rows(MANAGERS_DB).len(), 2);
}

#[test]
fn unreadable_relation_title_skips_only_that_relation() {
    let api = seeded();
    api.add_page(page("rel-nameless", vec![]));
    api.add_page(person("rel-alice", "Name", "Alice"));
    api.add_row(
        PROJECTS_DB,
        project("p1", "Shared", "Active", 9.0, &["rel-nameless", "rel-alice"]),
    );

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.added, 1);

    // The nameless relation caused exactly one call (its own retrieval) and
    // nothing on the manager side before Alice's relation started.
    let calls = api.calls();
    assert_eq!(calls[1], Call::RetrievePage("rel-nameless".into()));
    assert_eq!(calls[2], Call::RetrievePage("rel-alice".into()));
}

#[test]
fn missing_relation_page_is_a_relation_error() {
    let api = seeded();
    api.add_row(PROJECTS_DB, project("p1", "One", "Active", 1.0, &["rel-gone"]));
    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.errors, 1);
    assert_eq!(api.count(&Call::Query(MANAGERS_DB.into())), 0);
}

#[test]
fn manager_creation_failure_continues_with_next_relation() {
    let api = seeded();
    api.add_page(person("rel-alice", "Name", "Alice"));
    api.add_page(person("rel-bob", "Name", "Bob"));
    api.add_row(MANAGERS_DB, manager_row("mgr-bob", "Bob"));
    api.add_database("bob-projects");
    api.set_children(
        "mgr-bob",
        vec![nested_db_block("bob-projects", &fields().nested_table_title)],
    );
    api.add_row(
        PROJECTS_DB,
        project("p1", "Shared", "Active", 9.0, &["rel-alice", "rel-bob"]),
    );
    api.fail_on(Call::CreatePage(MANAGERS_DB.into()));

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.new_manager_pages, 0);
    assert_eq!(report.stats.added, 1);
    assert_eq!(api.rows("bob-projects").len(), 1);
}

#[test]
fn failed_manager_lookup_falls_through_to_creation() {
    let api = seeded();
    api.add_page(person("rel-alice", "Name", "Alice"));
    api.add_row(MANAGERS_DB, manager_row("mgr-alice", "Alice"));
    api.add_row(PROJECTS_DB, project("p1", "One", "Active", 1.0, &["rel-alice"]));
    api.fail_on(Call::Query(MANAGERS_DB.into()));

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.new_manager_pages, 1);
    assert_eq!(report.stats.added, 1);
    assert_eq!(
        api.rows(MANAGERS_DB).len(),
        2,
        "a failed lookup duplicates the manager"
    );
}

#[test]
fn schema_failure_leaves_manager_without_table() {
    let api = alice_setup();
    api.fail_on(Call::RetrieveDatabase(TEMPLATE_DB.into()));

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.new_manager_pages, 1);
    assert_eq!(report.stats.added, 0);
    assert_eq!(report.stats.errors, 1);

    let manager = &api.rows(MANAGERS_DB)[0];
    let blocks = api.children(&manager.id.0);
    assert!(!blocks.is_empty(), "ordinary template blocks still copied");
    assert!(blocks.iter().all(|b| b.kind != "child_database"));
}

#[test]
fn template_copy_failure_does_not_undo_manager_creation() {
    let api = alice_setup();
    api.fail_on(Call::ListChildren(TEMPLATE_PAGE.into()));

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.new_manager_pages, 1);
    assert_eq!(report.stats.errors, 1, "locator reports the missing table");
    assert_eq!(api.rows(MANAGERS_DB).len(), 1);
}

#[test]
fn missing_table_is_not_recreated_on_later_runs() {
    let api = alice_setup();
    api.fail_on(Call::ListChildren(TEMPLATE_PAGE.into()));
    pipeline::run(&api, &config()).expect("first run");
    api.clear_failures();
    api.reset_calls();

    let report = pipeline::run(&api, &config()).expect("second run");
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.new_manager_pages, 0);
    assert_eq!(api.count(&Call::ListChildren(TEMPLATE_PAGE.into())), 0);
}

#[test]
fn upsert_failure_is_counted_per_relation() {
    let api = alice_setup();
    pipeline::run(&api, &config()).expect("first run");
    let manager = api.rows(MANAGERS_DB)[0].id.0.clone();
    let table = nested_table(&api, &manager);
    api.fail_on(Call::Query(table));

    let report = pipeline::run(&api, &config()).expect("second run");
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.updated, 0);
}

#[test]
fn project_fetch_failure_is_fatal() {
    let api = seeded();
    api.fail_on(Call::Query(PROJECTS_DB.into()));
    let err = pipeline::run(&api, &config()).unwrap_err();
    assert!(matches!(err, SyncError::ProjectFetch { .. }), "got: {err}");
    assert_eq!(api.calls().len(), 1);
}

#[test]
fn one_bad_project_does_not_stop_the_run() {
    let api = alice_setup();
    api.add_row(PROJECTS_DB, project("p-empty", "", "Active", 1.0, &["rel-alice"]));
    api.add_row(
        PROJECTS_DB,
        project("p-2", "Second", "Active", 2.0, &["rel-alice"]),
    );

    let report = pipeline::run(&api, &config()).expect("run");
    assert_eq!(report.stats.processed, 3);
    assert_eq!(report.stats.added, 2);
    assert_eq!(report.stats.errors, 1);
}

#[test]
fn manager_without_template_is_created_empty() {
    let api = alice_setup();

    let report = pipeline::run(&api, &config_without_template()).expect("run");
    assert_eq!(report.stats.new_manager_pages, 1);
    assert_eq!(report.stats.added, 0);
    assert_eq!(report.stats.errors, 1, "locator reports the missing table");
    assert_eq!(api.count(&Call::ListChildren(TEMPLATE_PAGE.into())), 0);
    assert!(api.calls().iter().all(|c| !matches!(c, Call::Append(_))));
}
