//! Save/reset pipeline
//!
//! Applies the current submission to every attached unit allowed to take
//! it, then reports the aggregate outcome through an `updated=<status>`
//! parameter on the referring URL.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use pagehook_config::EngineConfig;
use pagehook_hooks::{EventBus, Host, Platform, Submission, ACTION, RESET_CONTROL, SUBMIT_CONTROL};

use crate::page::Page;
use crate::settings::ResetMode;
use crate::unit::Unit;

/// Transform that may veto saving a unit (context: unit id, page id).
pub const CAN_SAVE_FILTER: &str = "canSave";

/// Query parameter carrying the outcome.
pub const UPDATED_PARAM: &str = "updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveIntent {
    Save,
    Reset,
}

impl SaveIntent {
    /// Intent of a submission; `None` when it carries neither control.
    pub fn of(submission: &Submission) -> Option<Self> {
        if submission.contains(SUBMIT_CONTROL) {
            Some(SaveIntent::Save)
        } else if submission.contains(RESET_CONTROL) {
            Some(SaveIntent::Reset)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// At least one unit was reset
    Reset,
    /// At least one unit reported a change
    Updated,
    Unchanged,
}

impl SaveStatus {
    /// Value of the `updated` query parameter.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            SaveStatus::Reset => "reset",
            SaveStatus::Updated => "true",
            SaveStatus::Unchanged => "false",
        }
    }
}

/// Outcome for one unit the pipeline touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitResult {
    pub unit_id: String,
    pub status: SaveStatus,
}

/// Result of a submission that was not redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub url: String,
    pub status: SaveStatus,
    pub results: Vec<UnitResult>,
}

/// Apply the current submission to `page`'s units.
///
/// With `redirect` the host is redirected to the outcome URL and `None` is
/// returned; otherwise the outcome is returned.
pub fn submit(page: &Page, host: &mut dyn Host, redirect: bool) -> Option<SaveOutcome> {
    let request = host.request().clone();
    let persisted_state_id = page.persisted_state_id();

    let intent = SaveIntent::of(&request.submission);
    let action_matches = request.submission.get_str(ACTION) == Some(persisted_state_id.as_str());

    let (status, results) = match intent {
        Some(intent) if action_matches => apply(page, host, intent, request.submission),
        _ => {
            debug!(
                "Submission for '{}' not applied (intent {:?}, action match {})",
                persisted_state_id, intent, action_matches
            );
            (SaveStatus::Unchanged, Vec::new())
        }
    };

    let url = with_query_param(&request.referrer, UPDATED_PARAM, status.as_query_value());
    info!("Saved '{}': {}", persisted_state_id, status.as_query_value());

    if redirect {
        host.redirect(&url);
        return None;
    }
    Some(SaveOutcome {
        url,
        status,
        results,
    })
}

fn apply(
    page: &Page,
    host: &mut dyn Host,
    intent: SaveIntent,
    submission: Submission,
) -> (SaveStatus, Vec<UnitResult>) {
    let reset_mode = page.ensure_settings(&*host).reset_mode;
    debug!(
        "Applying {:?} with {} submitted values to '{}'",
        intent,
        submission.len(),
        page.page_id()
    );
    let mut working = submission;
    let mut results = Vec::new();

    for unit in page.units() {
        if !can_save(page, &*host, unit.as_ref(), &working) {
            debug!("Unit '{}' may not be saved", unit.id());
            continue;
        }

        let status = match intent {
            SaveIntent::Reset => {
                fields_to_default(unit.as_ref(), &mut working, reset_mode);
                unit.save(&working);
                SaveStatus::Reset
            }
            SaveIntent::Save => {
                if unit.save(&working) {
                    SaveStatus::Updated
                } else {
                    SaveStatus::Unchanged
                }
            }
        };
        results.push(UnitResult {
            unit_id: unit.id().to_string(),
            status,
        });
    }

    (aggregate(&results), results)
}

fn aggregate(results: &[UnitResult]) -> SaveStatus {
    if results.iter().any(|r| r.status == SaveStatus::Reset) {
        SaveStatus::Reset
    } else if results.iter().any(|r| r.status == SaveStatus::Updated) {
        SaveStatus::Updated
    } else {
        SaveStatus::Unchanged
    }
}

/// Whether `unit` may be saved from the current request.
///
/// The unit must allow saving, carry a valid per-unit token, not be in an
/// autosave or cross-site-switched request, and list the configured page
/// category among its surface types. The `"canSave"` transform has the last
/// word.
pub fn can_save<H>(page: &Page, host: &H, unit: &dyn Unit, submission: &Submission) -> bool
where
    H: EventBus + Platform + ?Sized,
{
    let config: Arc<EngineConfig> = page.config();
    let request = host.request();

    let token_valid = submission
        .get_str(&config.token_key(unit.id()))
        .is_some_and(|token| host.verify_token(token, unit.id()));

    let allowed = unit.save_enabled()
        && token_valid
        && !request.autosave
        && unit.surface_types().iter().any(|t| *t == config.page_category)
        && !request.cross_site_switched;

    let context = [Value::String(unit.id().to_string()), Value::String(page.page_id())];
    host.apply_transform(CAN_SAVE_FILTER, Value::Bool(allowed), &context) == Value::Bool(true)
}

/// Rewrite every field of `unit` in `submission` to its default, or to `""`
/// when erasing.
pub fn fields_to_default(unit: &dyn Unit, submission: &mut Submission, mode: ResetMode) {
    for field in unit.fields() {
        let value = match (mode, field.default) {
            (ResetMode::Default, Some(default)) => default,
            _ => Value::String(String::new()),
        };
        submission.insert(field.id, value);
    }
}

/// Set `key=value` on `url`, replacing an existing `key` parameter.
pub fn with_query_param(url: &str, key: &str, value: &str) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let (path, query) = base.split_once('?').unwrap_or((base, ""));

    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some(key))
        .map(str::to_string)
        .collect();
    pairs.push(format!("{}={}", key, value));

    let mut out = format!("{}?{}", path, pairs.join("&"));
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{FieldSpec, MemoryUnit};
    use pagehook_hooks::Request;
    use pagehook_test_utils::{TestHost, VALID_TOKEN};
    use serde_json::json;

    const REFERRER: &str = "https://example.test/admin.php?page=opts";

    fn setup(unit: MemoryUnit) -> (Page, Arc<MemoryUnit>) {
        let page = Page::new("opts", "opt1").unwrap();
        let unit = Arc::new(unit);
        page.attach_unit(unit.clone());
        (page, unit)
    }

    fn host(submission: Submission) -> TestHost {
        TestHost::new().with_valid_token().with_request(
            Request::new()
                .with_referrer(REFERRER)
                .with_submission(submission),
        )
    }

    fn fields_unit() -> MemoryUnit {
        MemoryUnit::builder("u1")
            .field(FieldSpec::new("f1").with_default("D1"))
            .field(FieldSpec::new("f2"))
            .build()
    }

    #[test]
    fn test_query_param() {
        assert_eq!(with_query_param("/a", "updated", "true"), "/a?updated=true");
        assert_eq!(
            with_query_param("/a?page=x&updated=false#top", "updated", "reset"),
            "/a?page=x&updated=reset#top"
        );
        assert_eq!(with_query_param("", "updated", "false"), "?updated=false");
    }

    #[test]
    fn test_intent() {
        assert_eq!(SaveIntent::of(&Submission::new().with(SUBMIT_CONTROL, "1")), Some(SaveIntent::Save));
        assert_eq!(SaveIntent::of(&Submission::new().with(RESET_CONTROL, "1")), Some(SaveIntent::Reset));
        assert_eq!(SaveIntent::of(&Submission::new()), None);
    }

    #[test]
    fn test_save_updates_changed_units() {
        let (page, unit) = setup(fields_unit());
        let mut host = host(
            Submission::new()
                .with(ACTION, "opt1")
                .with(SUBMIT_CONTROL, "1")
                .with("token_u1", VALID_TOKEN)
                .with("f1", "new"),
        );

        let outcome = submit(&page, &mut host, false).unwrap();
        assert_eq!(outcome.status, SaveStatus::Updated);
        assert_eq!(outcome.url, format!("{}&updated=true", REFERRER));
        assert_eq!(unit.stored_value("f1"), Some(json!("new")));

        let again = submit(&page, &mut host, false).unwrap();
        assert_eq!(again.status, SaveStatus::Unchanged);
        assert_eq!(again.results.len(), 1);
    }

    #[test]
    fn test_erase_mode_blanks_defaults() {
        let unit = MemoryUnit::builder("u1")
            .setting("reset_mode", "erase")
            .unwrap()
            .field(FieldSpec::new("f1").with_default("D1"))
            .build();
        let (page, unit) = setup(unit);
        let mut host = host(
            Submission::new()
                .with(ACTION, "opt1")
                .with(RESET_CONTROL, "1")
                .with("token_u1", VALID_TOKEN),
        );

        submit(&page, &mut host, false).unwrap();
        assert_eq!(unit.submissions()[0].get("f1"), Some(&json!("")));
    }

    #[test]
    fn test_missing_token_skips_unit() {
        let (page, unit) = setup(fields_unit());
        let mut host = host(
            Submission::new()
                .with(ACTION, "opt1")
                .with(SUBMIT_CONTROL, "1")
                .with("f1", "new"),
        );

        let outcome = submit(&page, &mut host, false).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.status, SaveStatus::Unchanged);
        assert!(unit.submissions().is_empty());
    }

    #[test]
    fn test_can_save_guards() {
        let submission = Submission::new().with("token_u1", VALID_TOKEN);
        let page = Page::new("opts", "opt1").unwrap();

        let unit = fields_unit();
        assert!(can_save(&page, &host(Submission::new()), &unit, &submission));

        let disabled = MemoryUnit::builder("u1").save_enabled(false).build();
        assert!(!can_save(&page, &host(Submission::new()), &disabled, &submission));

        let wrong_surface = MemoryUnit::builder("u1").surface_types(["post"]).build();
        assert!(!can_save(&page, &host(Submission::new()), &wrong_surface, &submission));

        let autosave = TestHost::new()
            .with_valid_token()
            .with_request(Request::new().with_autosave(true));
        assert!(!can_save(&page, &autosave, &unit, &submission));

        let switched = TestHost::new()
            .with_valid_token()
            .with_request(Request::new().with_cross_site_switched(true));
        assert!(!can_save(&page, &switched, &unit, &submission));
    }

    #[test]
    fn test_can_save_filter_vetoes() {
        let page = Page::new("opts", "opt1").unwrap();
        let mut host = host(Submission::new());
        host.register_transform(
            CAN_SAVE_FILTER,
            Arc::new(|allowed: Value, ctx: &[Value]| {
                if ctx == [json!("u1"), json!("opts")] {
                    json!(false)
                } else {
                    allowed
                }
            }),
            10,
            3,
        );
        let submission = Submission::new().with("token_u1", VALID_TOKEN);
        assert!(!can_save(&page, &host, &fields_unit(), &submission));

        let other = MemoryUnit::builder("u2").build();
        let submission = Submission::new().with("token_u2", VALID_TOKEN);
        assert!(can_save(&page, &host, &other, &submission));
    }

    #[test]
    fn test_redirect_mode() {
        let (page, _unit) = setup(fields_unit());
        let mut host = host(Submission::new().with(ACTION, "opt1"));

        assert!(submit(&page, &mut host, true).is_none());
        assert_eq!(host.redirects, vec![format!("{}&updated=false", REFERRER)]);
    }
}
