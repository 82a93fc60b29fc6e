//! Save and reset submissions from the host's point of view.

use std::sync::Arc;

use pagehook::{FieldSpec, MemoryUnit, Page, PageRegistry, SaveStatus, UnitResult};
use pagehook_hooks::{
    EventBus, Request, Submission, TransformFn, ACTION, RESET_CONTROL, SUBMIT_CONTROL,
};
use pagehook_test_utils::{TestHost, VALID_TOKEN};
use serde_json::{json, Value};

const REFERRER: &str = "https://example.test/admin/options";

fn unit_with_fields(id: &str) -> Arc<MemoryUnit> {
    Arc::new(
        MemoryUnit::builder(id)
            .field(FieldSpec::new("f1").with_default("D1"))
            .field(FieldSpec::new("f2"))
            .build(),
    )
}

fn attach(units: &[Arc<MemoryUnit>]) -> Page {
    let mut registry = PageRegistry::new();
    let mut page = None;
    for unit in units {
        page = Some(registry.attach(unit.clone(), "opts", "opt1", None).unwrap());
    }
    page.unwrap()
}

fn request(submission: Submission) -> Request {
    Request::new()
        .with_referrer(REFERRER)
        .with_submission(submission)
}

#[test]
fn test_reset_applies_field_defaults() {
    let unit = unit_with_fields("u1");
    let page = attach(&[unit.clone()]);
    let mut host = TestHost::new().with_valid_token().with_request(request(
        Submission::new()
            .with(ACTION, "opt1")
            .with(RESET_CONTROL, "Reset")
            .with("token_u1", VALID_TOKEN)
            .with("f1", "typed")
            .with("f2", "typed"),
    ));
    page.init(&mut host);

    let outcome = page.save(&mut host, false).unwrap();

    assert_eq!(outcome.url, format!("{}?updated=reset", REFERRER));
    assert_eq!(outcome.status, SaveStatus::Reset);
    assert_eq!(
        outcome.results,
        vec![UnitResult {
            unit_id: "u1".to_string(),
            status: SaveStatus::Reset,
        }]
    );

    let received = &unit.submissions()[0];
    assert_eq!(received.get("f1"), Some(&json!("D1")));
    assert_eq!(received.get("f2"), Some(&json!("")));
    assert_eq!(unit.stored_value("f1"), Some(json!("D1")));
}

#[test]
fn test_action_mismatch_changes_nothing() {
    let unit = unit_with_fields("u1");
    let page = attach(&[unit.clone()]);
    let mut host = TestHost::new().with_valid_token().with_request(request(
        Submission::new()
            .with(ACTION, "someone-else")
            .with(SUBMIT_CONTROL, "Save")
            .with("token_u1", VALID_TOKEN)
            .with("f1", "typed"),
    ));

    let outcome = page.save(&mut host, false).unwrap();

    assert_eq!(outcome.url, format!("{}?updated=false", REFERRER));
    assert!(outcome.results.is_empty());
    assert!(unit.submissions().is_empty());
}

#[test]
fn test_submit_trigger_redirects() {
    let unit = unit_with_fields("u1");
    let page = attach(&[unit.clone()]);
    let mut host = TestHost::new().with_valid_token().with_request(request(
        Submission::new()
            .with(ACTION, "opt1")
            .with(SUBMIT_CONTROL, "Save")
            .with("token_u1", VALID_TOKEN)
            .with("f1", "typed"),
    ));
    page.init(&mut host);

    host.dispatch("submit-opt1", &[]);

    assert_eq!(host.redirects, vec![format!("{}?updated=true", REFERRER)]);
    assert_eq!(unit.stored_value("f1"), Some(json!("typed")));
}

#[test]
fn test_tokens_are_per_unit() {
    let first = unit_with_fields("u1");
    let second = unit_with_fields("u2");
    let page = attach(&[first.clone(), second.clone()]);
    let mut host = TestHost::new()
        .accept_token("tok-1", "u1")
        .with_request(request(
            Submission::new()
                .with(ACTION, "opt1")
                .with(SUBMIT_CONTROL, "Save")
                .with("token_u1", "tok-1")
                .with("token_u2", "tok-1")
                .with("f1", "typed"),
        ));

    let outcome = page.save(&mut host, false).unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].unit_id, "u1");
    assert!(second.submissions().is_empty());
}

#[test]
fn test_aggregate_prefers_updated_over_unchanged() {
    let changed = unit_with_fields("u1");
    let untouched = Arc::new(MemoryUnit::builder("u2").field(FieldSpec::new("g")).build());
    let page = attach(&[changed, untouched]);
    let mut host = TestHost::new().with_valid_token().with_request(request(
        Submission::new()
            .with(ACTION, "opt1")
            .with(SUBMIT_CONTROL, "Save")
            .with("token_u1", VALID_TOKEN)
            .with("token_u2", VALID_TOKEN)
            .with("f1", "typed"),
    ));

    let outcome = page.save(&mut host, false).unwrap();

    assert_eq!(outcome.status, SaveStatus::Updated);
    let statuses: Vec<_> = outcome.results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![SaveStatus::Updated, SaveStatus::Unchanged]);
}

#[test]
fn test_autosave_and_cross_site_requests_are_skipped() {
    for req in [
        request(
            Submission::new()
                .with(ACTION, "opt1")
                .with(SUBMIT_CONTROL, "Save")
                .with("token_u1", VALID_TOKEN),
        )
        .with_autosave(true),
        request(
            Submission::new()
                .with(ACTION, "opt1")
                .with(SUBMIT_CONTROL, "Save")
                .with("token_u1", VALID_TOKEN),
        )
        .with_cross_site_switched(true),
    ] {
        let unit = unit_with_fields("u1");
        let page = attach(&[unit.clone()]);
        let mut host = TestHost::new().with_valid_token().with_request(req);

        let outcome = page.save(&mut host, false).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.status, SaveStatus::Unchanged);
    }
}

#[test]
fn test_can_save_transform_has_last_word() {
    let unit = Arc::new(
        MemoryUnit::builder("u1")
            .save_enabled(false)
            .field(FieldSpec::new("f1"))
            .build(),
    );
    let page = attach(&[unit.clone()]);
    let mut host = TestHost::new().with_request(request(
        Submission::new()
            .with(ACTION, "opt1")
            .with(SUBMIT_CONTROL, "Save")
            .with("f1", "typed"),
    ));
    let grant: TransformFn =
        Arc::new(|_: Value, ctx: &[Value]| json!(ctx.first() == Some(&json!("u1"))));
    host.register_transform("canSave", grant, 10, 3);

    let outcome = page.save(&mut host, false).unwrap();

    assert_eq!(outcome.status, SaveStatus::Updated);
    assert_eq!(unit.stored_value("f1"), Some(json!("typed")));
}
