//! Test utilities for pagehook crates
//!
//! # TestHost
//!
//! A [`Host`](pagehook_hooks::Host) that keeps everything in memory:
//! - callbacks live in a [`MemoryBus`]
//! - every platform call is recorded in a public field for assertions
//! - surface registration and token verification can be made to fail
//!
//! ```
//! use pagehook_hooks::{Callback, HookRegistrar, NoResolver, Platform, RawHookSpec};
//! use pagehook_test_utils::TestHost;
//!
//! let mut host = TestHost::new();
//! HookRegistrar::new(&NoResolver).register(
//!     vec![RawHookSpec::new("hello")
//!         .trigger("ping")
//!         .direct(Callback::notification(|host, _| host.emit("pong")))],
//!     "doc",
//!     &mut host,
//! );
//!
//! assert_eq!(host.dispatch("ping", &[]), 1);
//! assert_eq!(host.output, "pong");
//! ```

use std::collections::HashSet;

use pagehook_hooks::{
    Asset, ContentBox, EventBus, MenuParams, MemoryBus, Notice, NotificationFn, Platform, Request,
    TransformFn,
};
use serde_json::Value;
use tracing::trace;

/// Token accepted for every action by [`TestHost::with_valid_token`].
pub const VALID_TOKEN: &str = "valid-token";

/// Recording in-memory host.
#[derive(Debug, Default)]
pub struct TestHost {
    pub bus: MemoryBus,
    pub request: Request,
    pub top_level_surfaces: Vec<MenuParams>,
    pub nested_surfaces: Vec<MenuParams>,
    /// `(group, name)` pairs passed to `register_setting`
    pub settings: Vec<(String, String)>,
    pub content_boxes: Vec<ContentBox>,
    pub assets: Vec<Asset>,
    pub notices: Vec<Notice>,
    pub redirects: Vec<String>,
    /// Everything written through `emit`
    pub output: String,
    valid_tokens: HashSet<(String, String)>,
    accept_any_valid_token: bool,
    deny_top_level: bool,
    deny_nested: bool,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.request = request;
        self
    }

    /// Accept [`VALID_TOKEN`] for any action.
    pub fn with_valid_token(mut self) -> Self {
        self.accept_any_valid_token = true;
        self
    }

    /// Accept `token` for `action` only.
    pub fn accept_token(mut self, token: impl Into<String>, action: impl Into<String>) -> Self {
        self.valid_tokens.insert((token.into(), action.into()));
        self
    }

    /// Make every top-level surface registration fail.
    pub fn deny_top_level(mut self) -> Self {
        self.deny_top_level = true;
        self
    }

    /// Make every nested surface registration fail.
    pub fn deny_nested(mut self) -> Self {
        self.deny_nested = true;
        self
    }

    /// Run the notification callbacks of `trigger`.
    pub fn dispatch(&mut self, trigger: &str, args: &[Value]) -> usize {
        pagehook_hooks::dispatch(self, trigger, args)
    }

    /// Handle the host hands out for a surface, derived like a typical admin
    /// platform does from the parent and the slug.
    pub fn surface_handle(parent_slug: &str, menu_slug: &str) -> String {
        let parent = parent_slug
            .trim_end_matches(".php")
            .trim_start_matches("edit.php?post_type=");
        let parent = if parent.is_empty() { "admin" } else { parent };
        format!("{}_page_{}", parent, menu_slug)
    }
}

impl EventBus for TestHost {
    fn register_notification(
        &mut self,
        trigger: &str,
        callback: NotificationFn,
        priority: i32,
        arity: usize,
    ) -> bool {
        self.bus
            .register_notification(trigger, callback, priority, arity)
    }

    fn register_transform(
        &mut self,
        trigger: &str,
        callback: TransformFn,
        priority: i32,
        arity: usize,
    ) -> bool {
        self.bus.register_transform(trigger, callback, priority, arity)
    }

    fn notifications(&self, trigger: &str) -> Vec<(NotificationFn, usize)> {
        self.bus.notifications(trigger)
    }

    fn transforms(&self, trigger: &str) -> Vec<(TransformFn, usize)> {
        self.bus.transforms(trigger)
    }
}

impl Platform for TestHost {
    fn register_top_level_surface(&mut self, params: &MenuParams) -> Option<String> {
        if self.deny_top_level {
            return None;
        }
        self.top_level_surfaces.push(params.clone());
        Some(format!("toplevel_page_{}", params.menu_slug))
    }

    fn register_nested_surface(&mut self, params: &MenuParams) -> Option<String> {
        if self.deny_nested {
            return None;
        }
        self.nested_surfaces.push(params.clone());
        Some(Self::surface_handle(&params.parent_slug, &params.menu_slug))
    }

    fn setting_registered(&self, name: &str) -> bool {
        self.settings.iter().any(|(_, registered)| registered == name)
    }

    fn register_setting(&mut self, group: &str, name: &str) {
        self.settings.push((group.to_string(), name.to_string()));
    }

    fn add_content_box(&mut self, content: ContentBox) {
        self.content_boxes.push(content);
    }

    fn enqueue_asset(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    fn add_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn request(&self) -> &Request {
        &self.request
    }

    fn verify_token(&self, token: &str, action: &str) -> bool {
        (self.accept_any_valid_token && token == VALID_TOKEN)
            || self
                .valid_tokens
                .contains(&(token.to_string(), action.to_string()))
    }

    fn redirect(&mut self, url: &str) {
        trace!("TestHost redirect to {}", url);
        self.redirects.push(url.to_string());
    }

    fn emit(&mut self, output: &str) {
        self.output.push_str(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagehook_hooks::{Callback, Host};
    use serde_json::json;
    use std::sync::Arc;

    fn emitter(tag: &'static str) -> NotificationFn {
        Arc::new(move |host: &mut dyn Host, args: &[Value]| {
            host.emit(&format!("{}{};", tag, args.len()));
        })
    }

    #[test]
    fn test_dispatch_order_and_arity() {
        let mut host = TestHost::new();
        host.register_notification("t", emitter("late"), 20, 2);
        host.register_notification("t", emitter("early"), 1, 0);
        host.register_notification("t", emitter("mid"), 10, 5);

        let ran = host.dispatch("t", &[json!(1), json!(2), json!(3)]);

        assert_eq!(ran, 3);
        assert_eq!(host.output, "early0;mid3;late2;");
    }

    #[test]
    fn test_dispatch_unknown_trigger() {
        let mut host = TestHost::new();
        assert_eq!(host.dispatch("nothing", &[]), 0);
    }

    #[test]
    fn test_callback_may_register_during_dispatch() {
        let mut host = TestHost::new();
        let Callback::Notification(registering) = Callback::notification(|host, _| {
            host.register_notification("t", emitter("added"), 10, 1);
        }) else {
            unreachable!()
        };
        host.register_notification("t", registering, 10, 1);

        assert_eq!(host.dispatch("t", &[]), 1);
        assert_eq!(host.output, "");
        assert_eq!(host.dispatch("t", &[]), 2);
        assert_eq!(host.output, "added0;");
    }

    #[test]
    fn test_token_verification() {
        let host = TestHost::new().accept_token("abc", "unit1");
        assert!(host.verify_token("abc", "unit1"));
        assert!(!host.verify_token("abc", "unit2"));
        assert!(!host.verify_token(VALID_TOKEN, "unit1"));

        let host = TestHost::new().with_valid_token();
        assert!(host.verify_token(VALID_TOKEN, "anything"));
    }

    #[test]
    fn test_surface_handles() {
        assert_eq!(TestHost::surface_handle("", "opts"), "admin_page_opts");
        assert_eq!(
            TestHost::surface_handle("options-general.php", "opts"),
            "options-general_page_opts"
        );
    }

    #[test]
    fn test_denied_surfaces() {
        let mut host = TestHost::new().deny_top_level().deny_nested();
        let params = MenuParams::default();
        assert!(host.register_top_level_surface(&params).is_none());
        assert!(host.register_nested_surface(&params).is_none());
        assert!(host.top_level_surfaces.is_empty());
    }
}
