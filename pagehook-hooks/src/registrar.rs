//! Hook registration and the hook-list filter

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use pagehook_common::{Pretty, Tokens};

use crate::callback::Callback;
use crate::host::EventBus;
use crate::normalize::{normalize, CallbackResolver};
use crate::spec::{HookSpec, RawHookSpec, RegisteredRef, DIRECT_REF_PREFIX};

/// Transform applied to every hook list before registration.
pub const PAGE_HOOKS_FILTER: &str = "pageHooks";

/// Register each spec with the bus primitive for its kind.
///
/// Returns one acknowledgement per registration the bus accepted.
pub fn register<B>(specs: &[HookSpec], bus: &mut B) -> Vec<RegisteredRef>
where
    B: EventBus + ?Sized,
{
    let mut registered = Vec::with_capacity(specs.len());

    for spec in specs {
        let accepted = match &spec.callback {
            Callback::Notification(f) => {
                bus.register_notification(&spec.trigger, f.clone(), spec.priority, spec.arity)
            }
            Callback::Transform(f) => {
                bus.register_transform(&spec.trigger, f.clone(), spec.priority, spec.arity)
            }
        };

        if accepted {
            debug!("Registered {} '{}' on '{}'", spec.kind, spec.id, spec.trigger);
            registered.push(RegisteredRef::new(&spec.trigger, &spec.id));
        } else {
            warn!("Bus rejected {} '{}' on '{}'", spec.kind, spec.id, spec.trigger);
        }
    }

    registered
}

/// Resolves `"@<id>"` references against the callbacks of the list being
/// filtered, then falls back to the caller's resolver.
struct FilterResolver<'a> {
    direct: HashMap<String, Callback>,
    fallback: &'a dyn CallbackResolver,
}

impl CallbackResolver for FilterResolver<'_> {
    fn resolve(&self, name: &str) -> Option<Callback> {
        if name.starts_with(DIRECT_REF_PREFIX) {
            if let Some(callback) = self.direct.get(name) {
                return Some(callback.clone());
            }
        }
        self.fallback.resolve(name)
    }
}

/// Let external code edit a hook list before it is registered.
///
/// The list is serialized to a JSON array and passed through the
/// `"pageHooks"` transform and then `"pageHooks_<method>"`, both with
/// `method` as context. An unchanged result returns `specs` as they were;
/// a changed one is parsed and normalized again, so added entries are
/// validated and removed entries disappear. Entries the filter adds get the
/// same `default_trigger` and `tokens` as the original list. A result that
/// is not an array is ignored.
pub fn filter_specs<B>(
    specs: Vec<HookSpec>,
    method: &str,
    bus: &B,
    resolver: &dyn CallbackResolver,
    default_trigger: Option<&str>,
    tokens: Option<&Tokens>,
) -> Vec<HookSpec>
where
    B: EventBus + ?Sized,
{
    let original = Value::Array(specs.iter().map(HookSpec::to_value).collect());
    let context = [Value::String(method.to_string())];

    let filtered = bus.apply_transform(PAGE_HOOKS_FILTER, original.clone(), &context);
    let filtered = bus.apply_transform(
        &format!("{}_{}", PAGE_HOOKS_FILTER, method),
        filtered,
        &context,
    );

    if filtered == original {
        return specs;
    }

    let Value::Array(entries) = filtered else {
        warn!(
            "Ignoring '{}' result for '{}': not a list{}",
            PAGE_HOOKS_FILTER,
            method,
            Pretty(&filtered)
        );
        return specs;
    };

    debug!("Hook list for '{}' changed by filter, re-normalizing", method);

    let resolver = FilterResolver {
        direct: specs
            .iter()
            .map(|spec| (spec.direct_ref(), spec.callback.clone()))
            .collect(),
        fallback: resolver,
    };
    let raw: Vec<RawHookSpec> = entries.iter().filter_map(RawHookSpec::from_value).collect();

    normalize(raw, default_trigger, tokens, &resolver)
}

/// Normalize, filter and register hook lists with one resolver, default
/// trigger and token table.
pub struct HookRegistrar<'a> {
    resolver: &'a dyn CallbackResolver,
    default_trigger: Option<String>,
    tokens: Option<Tokens>,
}

impl<'a> HookRegistrar<'a> {
    pub fn new(resolver: &'a dyn CallbackResolver) -> Self {
        Self {
            resolver,
            default_trigger: None,
            tokens: None,
        }
    }

    pub fn with_default_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.default_trigger = Some(trigger.into());
        self
    }

    pub fn with_tokens(mut self, tokens: Tokens) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn normalize(&self, raw: Vec<RawHookSpec>) -> Vec<HookSpec> {
        normalize(
            raw,
            self.default_trigger.as_deref(),
            self.tokens.as_ref(),
            self.resolver,
        )
    }

    pub fn filter<B>(&self, specs: Vec<HookSpec>, method: &str, bus: &B) -> Vec<HookSpec>
    where
        B: EventBus + ?Sized,
    {
        filter_specs(
            specs,
            method,
            bus,
            self.resolver,
            self.default_trigger.as_deref(),
            self.tokens.as_ref(),
        )
    }

    /// Normalize `raw`, run the hook-list filter for `method` and register
    /// what remains.
    pub fn register<B>(&self, raw: Vec<RawHookSpec>, method: &str, bus: &mut B) -> Vec<RegisteredRef>
    where
        B: EventBus + ?Sized,
    {
        let specs = self.normalize(raw);
        let specs = self.filter(specs, method, &*bus);
        register(&specs, bus)
    }
}
