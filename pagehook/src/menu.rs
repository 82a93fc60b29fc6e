//! Menu surface registration

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use pagehook_common::{merge_strict, Pretty};
use pagehook_hooks::{EventBus, Host, MenuParams, NotificationFn};

use crate::page::Page;
use crate::settings::SharedConfig;

/// Transform applied to the computed menu parameters.
pub const MENU_PARAMS_FILTER: &str = "menuParams";

/// Result of a successful menu registration.
#[derive(Debug, Clone)]
pub struct MenuRegistration {
    /// Surface handle assigned by the host
    pub handle: String,
    /// Parameters the surface was registered with
    pub params: MenuParams,
}

/// Menu parameters derived from the page's settings. The action renders the
/// page and echoes it.
pub fn compute_menu_params(page: &Page, settings: &SharedConfig) -> MenuParams {
    let render_page = page.clone();
    let action: NotificationFn = Arc::new(move |host: &mut dyn Host, _: &[Value]| {
        render_page.render(host, true);
    });

    MenuParams {
        parent_slug: settings.parent_slug.clone(),
        page_title: settings.title.clone(),
        menu_title: settings.menu_title.clone(),
        capability: settings.capability.clone(),
        menu_slug: page.page_id(),
        action: Some(action),
        icon: settings.icon.clone(),
        position: settings.position.clone(),
        hide_menu: settings.hide_menu,
        menu_first_sub: settings.menu_first_sub.clone(),
    }
}

/// Pass `params` through the `"menuParams"` transform (context: page id).
///
/// The result is merged strictly over the computed parameters, so a partial
/// result keeps every key it leaves out and values of the wrong kind are
/// dropped. The render action is not part of the transformed data and is
/// kept. A result that does not parse as menu parameters is ignored.
pub fn filter_menu_params<B>(page: &Page, params: MenuParams, bus: &B) -> MenuParams
where
    B: EventBus + ?Sized,
{
    let Ok(original) = serde_json::to_value(&params) else {
        return params;
    };
    let context = [Value::String(page.page_id())];
    let filtered = bus.apply_transform(MENU_PARAMS_FILTER, original.clone(), &context);
    // Partial results only replace the keys they carry.
    let merged = merge_strict(&original, &filtered, false);
    if merged == original {
        return params;
    }

    match serde_json::from_value::<MenuParams>(merged) {
        Ok(mut changed) => {
            debug!("'{}' changed menu parameters{}", MENU_PARAMS_FILTER, Pretty(&changed));
            changed.action = params.action;
            changed
        }
        Err(e) => {
            warn!("Ignoring invalid '{}' result: {}", MENU_PARAMS_FILTER, e);
            params
        }
    }
}

/// Register `params` as a host surface.
///
/// Hidden pages and pages with a parent become nested surfaces; anything
/// else is a top-level surface, followed by a relabeled first nested entry
/// when `menu_first_sub` is set. Returns the handle of the page's surface.
pub fn register_with_host(params: &MenuParams, host: &mut dyn Host) -> Option<String> {
    if params.hide_menu || !params.parent_slug.is_empty() {
        let handle = host.register_nested_surface(params);
        debug!("Nested surface for '{}': {:?}", params.menu_slug, handle);
        return handle;
    }

    let handle = host.register_top_level_surface(params)?;
    debug!("Top-level surface for '{}': {}", params.menu_slug, handle);

    if !params.menu_first_sub.is_empty() {
        let first = MenuParams {
            parent_slug: params.menu_slug.clone(),
            menu_title: params.menu_first_sub.clone(),
            ..params.clone()
        };
        if host.register_nested_surface(&first).is_none() {
            warn!("Host rejected first submenu entry of '{}'", params.menu_slug);
        }
    }

    Some(handle)
}
