//! Hook-spec normalization
//!
//! Turns loosely written [`RawHookSpec`]s into complete [`HookSpec`]s:
//! tokens are substituted, defaults filled in, named callbacks resolved,
//! and anything invalid or disabled is dropped. Order is preserved.

use serde_json::Value;
use tracing::debug;

use pagehook_common::Tokens;

use crate::callback::Callback;
use crate::spec::{CallbackRef, HookKind, HookSpec, RawHookSpec, DEFAULT_ARITY, DEFAULT_PRIORITY};

/// Resolves callback names to invocable callbacks.
///
/// This is the only way a named callback becomes callable; a name the
/// resolver does not know is not invocable.
pub trait CallbackResolver {
    fn resolve(&self, name: &str) -> Option<Callback>;
}

impl<F> CallbackResolver for F
where
    F: Fn(&str) -> Option<Callback>,
{
    fn resolve(&self, name: &str) -> Option<Callback> {
        self(name)
    }
}

/// Resolver that knows no names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl CallbackResolver for NoResolver {
    fn resolve(&self, _name: &str) -> Option<Callback> {
        None
    }
}

/// Normalize `raw_specs`, dropping every spec that fails validation.
///
/// A spec is kept when it has a non-empty id, a trigger (its own or
/// `default_trigger`), a valid kind (default `notification`), a callback
/// that resolves to the declared kind, and `enabled` is not `false`.
pub fn normalize(
    raw_specs: Vec<RawHookSpec>,
    default_trigger: Option<&str>,
    tokens: Option<&Tokens>,
    resolver: &dyn CallbackResolver,
) -> Vec<HookSpec> {
    raw_specs
        .into_iter()
        .filter_map(|raw| {
            let raw = match tokens {
                Some(tokens) if !tokens.is_empty() => raw.apply_tokens(tokens),
                _ => raw,
            };
            let label = raw.id.clone().unwrap_or_else(|| "<missing id>".to_string());
            match normalize_one(raw, default_trigger, resolver) {
                Ok(spec) => Some(spec),
                Err(reason) => {
                    debug!("Dropping hook spec '{}': {}", label, reason);
                    None
                }
            }
        })
        .collect()
}

fn normalize_one(
    raw: RawHookSpec,
    default_trigger: Option<&str>,
    resolver: &dyn CallbackResolver,
) -> Result<HookSpec, &'static str> {
    let id = raw.id.filter(|id| !id.is_empty()).ok_or("missing id")?;

    if matches!(raw.enabled, Some(Value::Bool(false))) {
        return Err("disabled");
    }

    let trigger = raw
        .trigger
        .filter(|t| !t.is_empty())
        .or_else(|| default_trigger.filter(|t| !t.is_empty()).map(str::to_string))
        .ok_or("missing trigger")?;

    let kind = match raw.kind.as_deref() {
        None => HookKind::Notification,
        Some(kind) => HookKind::parse(kind).ok_or("invalid kind")?,
    };

    let callback = match raw.callback.ok_or("missing callback")? {
        CallbackRef::Direct(callback) => callback,
        CallbackRef::Named(name) => resolver.resolve(&name).ok_or("unresolvable callback")?,
    };
    if callback.kind() != kind {
        return Err("callback does not match kind");
    }

    Ok(HookSpec {
        id,
        trigger,
        callback,
        kind,
        priority: raw.priority.unwrap_or(DEFAULT_PRIORITY),
        arity: raw.arity.unwrap_or(DEFAULT_ARITY),
    })
}
