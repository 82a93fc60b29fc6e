//! Host boundary
//!
//! The engine never talks to a concrete platform. Everything it needs from
//! the host is split across two traits:
//!
//! - [`EventBus`] - callback registration and transform chains
//! - [`Platform`] - menu surfaces, settings, assets, notices, the current
//!   request, token verification and redirects
//!
//! [`Host`] is both at once and is what notification callbacks receive.

use serde_json::Value;
use tracing::trace;

use crate::callback::{NotificationFn, TransformFn};
use crate::request::Request;
use crate::surface::{Asset, ContentBox, MenuParams, Notice};

/// Synchronous named-trigger dispatcher.
///
/// Implementations order callbacks of one trigger by ascending priority and
/// then by registration order.
pub trait EventBus {
    /// Register a notification callback. Returns false when the bus rejects it.
    fn register_notification(
        &mut self,
        trigger: &str,
        callback: NotificationFn,
        priority: i32,
        arity: usize,
    ) -> bool;

    /// Register a transform callback. Returns false when the bus rejects it.
    fn register_transform(
        &mut self,
        trigger: &str,
        callback: TransformFn,
        priority: i32,
        arity: usize,
    ) -> bool;

    /// Notification callbacks for `trigger` in dispatch order, with their arity.
    fn notifications(&self, trigger: &str) -> Vec<(NotificationFn, usize)>;

    /// Transform callbacks for `trigger` in dispatch order, with their arity.
    fn transforms(&self, trigger: &str) -> Vec<(TransformFn, usize)>;

    /// Run the transform chain `name` over `value`.
    ///
    /// Each callback receives the running value plus up to `arity - 1`
    /// context arguments. With no callbacks registered the value is returned
    /// unchanged.
    fn apply_transform(&self, name: &str, value: Value, context: &[Value]) -> Value {
        self.transforms(name)
            .into_iter()
            .fold(value, |current, (callback, arity)| {
                let take = arity.saturating_sub(1).min(context.len());
                callback(current, &context[..take])
            })
    }
}

/// Platform primitives beyond the event bus.
pub trait Platform {
    /// Register a top-level menu surface, returning its handle.
    fn register_top_level_surface(&mut self, params: &MenuParams) -> Option<String>;

    /// Register a surface nested under `params.parent_slug`, returning its handle.
    fn register_nested_surface(&mut self, params: &MenuParams) -> Option<String>;

    fn setting_registered(&self, name: &str) -> bool;

    fn register_setting(&mut self, group: &str, name: &str);

    fn add_content_box(&mut self, content: ContentBox);

    fn enqueue_asset(&mut self, asset: Asset);

    fn add_notice(&mut self, notice: Notice);

    /// The request being served.
    fn request(&self) -> &Request;

    /// Check an anti-forgery `token` scoped to `action`.
    fn verify_token(&self, token: &str, action: &str) -> bool;

    fn redirect(&mut self, url: &str);

    /// Write output to the response.
    fn emit(&mut self, output: &str);
}

/// Everything a notification callback can reach.
pub trait Host: EventBus + Platform {}

impl<T: EventBus + Platform> Host for T {}

/// Run every notification callback registered on `trigger`.
///
/// The callback list is snapshotted first so callbacks may register further
/// hooks on the same host. Each callback receives at most `arity` arguments.
/// Returns the number of callbacks run.
pub fn dispatch(host: &mut dyn Host, trigger: &str, args: &[Value]) -> usize {
    let callbacks = host.notifications(trigger);
    trace!("Dispatching '{}' to {} callbacks", trigger, callbacks.len());

    for (callback, arity) in &callbacks {
        let take = (*arity).min(args.len());
        callback(&mut *host, &args[..take]);
    }

    callbacks.len()
}
