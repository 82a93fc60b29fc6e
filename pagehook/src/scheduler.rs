//! Two-phase hook scheduling
//!
//! A page registers its callbacks in two passes. Before the host has
//! assigned a surface handle only the early set can be registered; the late
//! set is keyed to the handle and registered once it exists.
//!
//! Both sets are declared as [`RawHookSpec`]s naming callbacks that
//! [`PageCallbacks`] resolves, with `{PAGE}`, `{OPT}` and `{HOOK}` tokens
//! standing for the page id, the persisted-state id and the surface handle.

use serde_json::{json, Value};
use tracing::debug;

use pagehook_common::{args_match, Tokens};
use pagehook_hooks::{
    Asset, Callback, CallbackResolver, ContentBox, Host, HookRegistrar, Notice, NoticeKind,
    RawHookSpec, RegisteredRef,
};

use crate::page::Page;
use crate::save::UPDATED_PARAM;
use crate::settings::PageFormat;

/// Host trigger on which page scripts are enqueued.
pub const ENQUEUE_SCRIPTS: &str = "enqueueScripts";
/// Host trigger for scripts printed in the page footer.
pub const FOOTER_SCRIPTS: &str = "footerScripts";

pub const TOKEN_PAGE: &str = "{PAGE}";
pub const TOKEN_OPT: &str = "{OPT}";
pub const TOKEN_HOOK: &str = "{HOOK}";

/// Token table of `page`.
pub fn tokens(page: &Page) -> Tokens {
    let mut tokens = Tokens::new();
    tokens.insert(TOKEN_PAGE.to_string(), Value::String(page.page_id()));
    tokens.insert(TOKEN_OPT.to_string(), Value::String(page.persisted_state_id()));
    tokens.insert(TOKEN_HOOK.to_string(), Value::String(page.surface_handle()));
    tokens
}

/// Hooks registered by `init`. Entries without a trigger take the page's
/// registration trigger.
pub fn early_hook_set(page: &Page) -> Vec<RawHookSpec> {
    let config = page.config();
    let simple = page
        .canonical_settings()
        .is_none_or(|settings| settings.page_format != PageFormat::PostLike);

    vec![
        RawHookSpec::new("menu").named("menu"),
        RawHookSpec::new("updated").named("updated").priority(11),
        RawHookSpec::new("setting")
            .trigger(config.init_trigger.as_str())
            .named("setting"),
        RawHookSpec::new("formScript")
            .trigger(ENQUEUE_SCRIPTS)
            .named("formScript")
            .enabled(simple),
        RawHookSpec::new("formMarkup")
            .trigger(FOOTER_SCRIPTS)
            .named("formMarkup")
            .enabled(simple),
        RawHookSpec::new("submit")
            .trigger(format!("submit-{}", TOKEN_OPT))
            .named("submit"),
    ]
}

/// Hooks keyed to the surface handle.
pub fn late_hook_set() -> Vec<RawHookSpec> {
    vec![
        RawHookSpec::new("content")
            .trigger(format!("load-{}", TOKEN_HOOK))
            .named("content"),
        RawHookSpec::new("styles")
            .trigger(format!("stylesPrinted-{}", TOKEN_HOOK))
            .named("styles"),
    ]
}

/// Early set while the page has no surface handle, late set after.
pub fn select_hook_set(page: &Page) -> Vec<RawHookSpec> {
    if page.surface_handle().is_empty() {
        early_hook_set(page)
    } else {
        late_hook_set()
    }
}

/// Normalize, filter and register the hook set `page` is due for.
///
/// The `"pageHooks_<method>"` filter is keyed `init` for the early set and
/// `register_on_host_menu` for the late one.
pub fn schedule(page: &Page, host: &mut dyn Host) -> Vec<RegisteredRef> {
    let method = if page.surface_handle().is_empty() {
        "init"
    } else {
        "register_on_host_menu"
    };

    let resolver = PageCallbacks::new(page.clone());
    let refs = HookRegistrar::new(&resolver)
        .with_default_trigger(page.registration_trigger())
        .with_tokens(tokens(page))
        .register(select_hook_set(page), method, host);

    debug!("Page '{}' scheduled {} hooks for {}", page.page_id(), refs.len(), method);
    page.record_registrations(&refs);
    refs
}

/// Resolves the callback names used in the page's hook sets.
pub struct PageCallbacks {
    page: Page,
}

impl PageCallbacks {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

impl CallbackResolver for PageCallbacks {
    fn resolve(&self, name: &str) -> Option<Callback> {
        let page = self.page.clone();
        let callback = match name {
            "menu" => Callback::notification(move |host, _| {
                page.register_on_host_menu(host);
            }),
            "updated" => Callback::notification(move |host, _| add_update_notice(&page, host)),
            "setting" => Callback::notification(move |host, _| {
                register_setting(&page, host);
            }),
            "formScript" => {
                Callback::notification(move |host, args| enqueue_form_script(&page, host, args))
            }
            "formMarkup" => {
                Callback::notification(move |host, args| print_form_markup(&page, host, args))
            }
            "submit" => Callback::notification(move |host, _| {
                page.save(host, true);
            }),
            "content" => Callback::notification(move |host, _| populate_content(&page, host)),
            "styles" => Callback::notification(move |host, _| enqueue_styles(&page, host)),
            _ => return None,
        };
        Some(callback)
    }
}

/// Show the outcome of a previous submission on this page.
fn add_update_notice(page: &Page, host: &mut dyn Host) {
    let page_id = page.page_id();
    let status = {
        let request = host.request();
        if request.query_param("page") != Some(page_id.as_str()) {
            return;
        }
        match request.query_param(UPDATED_PARAM) {
            Some(status) => status.to_string(),
            None => return,
        }
    };

    let (kind, message) = match status.as_str() {
        "true" => (NoticeKind::Success, "Settings saved."),
        "reset" => (NoticeKind::Success, "Settings reset."),
        _ => (NoticeKind::Warning, "No changes were saved."),
    };
    host.add_notice(Notice {
        surface: page.surface_handle(),
        kind,
        message: message.to_string(),
    });
}

/// Register the persisted-state setting unless the host already has it.
pub fn register_setting(page: &Page, host: &mut dyn Host) -> bool {
    let name = page.persisted_state_id();
    if host.setting_registered(&name) {
        debug!("Setting '{}' is already registered", name);
        return false;
    }
    host.register_setting(&name, &name);
    true
}

/// Whether a surface trigger's arguments point at this page.
fn is_own_surface(page: &Page, args: &[Value]) -> bool {
    let handle = page.surface_handle();
    !handle.is_empty() && args_match(args, &[Value::String(handle)], false)
}

fn enqueue_form_script(page: &Page, host: &mut dyn Host, args: &[Value]) {
    if is_own_surface(page, args) {
        host.enqueue_asset(Asset::Script(page.config().script_asset.clone()));
    }
}

/// Print the client-side form settings of a simple page.
fn print_form_markup(page: &Page, host: &mut dyn Host, args: &[Value]) {
    if !is_own_surface(page, args) {
        return;
    }
    let settings = page.ensure_settings(&*host);
    let data = json!({
        "page": page.page_id(),
        "option": page.persisted_state_id(),
        "columns": settings.page_columns,
        "save_button": settings.save_button,
        "reset_button": settings.reset_button,
    });
    host.emit(&format!(
        "<script type=\"application/json\" id=\"{}-form\">{}</script>",
        page.persisted_state_id(),
        data
    ));
}

/// Content boxes for post-like pages.
fn populate_content(page: &Page, host: &mut dyn Host) {
    let settings = page.ensure_settings(&*host);
    if settings.page_format != PageFormat::PostLike {
        return;
    }

    let surface = page.surface_handle();
    for unit in page.units() {
        host.add_content_box(ContentBox {
            id: unit.id().to_string(),
            title: unit.title().to_string(),
            surface: surface.clone(),
            context: unit.context().to_string(),
        });
    }
    host.enqueue_asset(Asset::Script(page.config().postbox_asset.clone()));
}

fn enqueue_styles(page: &Page, host: &mut dyn Host) {
    if page.ensure_settings(&*host).load_default_assets {
        host.enqueue_asset(Asset::Style(page.config().style_asset.clone()));
    }
}
