//! Hook declarations
//!
//! [`RawHookSpec`] is the loose form callers write: every field optional,
//! callbacks either given directly or named for later resolution.
//! [`HookSpec`] is what survives normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use pagehook_common::{substitute_tokens, Tokens};

use crate::callback::Callback;

pub const DEFAULT_PRIORITY: i32 = 10;
pub const DEFAULT_ARITY: usize = 1;

/// Prefix marking a reference to a callback held in a side table.
pub const DIRECT_REF_PREFIX: char = '@';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    Notification,
    Transform,
}

impl HookKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "notification" => Some(Self::Notification),
            "transform" => Some(Self::Transform),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::Transform => "transform",
        }
    }
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a raw spec refers to its callback.
#[derive(Debug, Clone)]
pub enum CallbackRef {
    Direct(Callback),
    /// Looked up through a `CallbackResolver` at normalization time
    Named(String),
}

/// A partially specified hook declaration.
#[derive(Debug, Clone, Default)]
pub struct RawHookSpec {
    pub id: Option<String>,
    pub trigger: Option<String>,
    pub callback: Option<CallbackRef>,
    pub kind: Option<String>,
    pub priority: Option<i32>,
    pub arity: Option<usize>,
    /// Anything but `false` counts as enabled
    pub enabled: Option<Value>,
}

impl RawHookSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(CallbackRef::Named(name.into()));
        self
    }

    pub fn direct(mut self, callback: Callback) -> Self {
        self.callback = Some(CallbackRef::Direct(callback));
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn enabled(mut self, enabled: impl Into<Value>) -> Self {
        self.enabled = Some(enabled.into());
        self
    }

    /// Substitute `tokens` into the string fields and `enabled`.
    ///
    /// A string field whose substitution yields a non-string becomes unset,
    /// which makes the spec invalid for `id`, `trigger` and a named callback.
    pub fn apply_tokens(mut self, tokens: &Tokens) -> Self {
        let mut fields = Map::new();
        let strings = [
            ("id", self.id.as_deref()),
            ("trigger", self.trigger.as_deref()),
            ("kind", self.kind.as_deref()),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        if let Some(CallbackRef::Named(name)) = &self.callback {
            fields.insert("callback".to_string(), Value::String(name.clone()));
        }
        if let Some(enabled) = &self.enabled {
            fields.insert("enabled".to_string(), enabled.clone());
        }

        let substituted = substitute_tokens(&Value::Object(fields), tokens, false);
        let text = |key: &str| substituted.get(key).and_then(Value::as_str).map(str::to_string);

        self.id = self.id.and(text("id"));
        self.trigger = self.trigger.and(text("trigger"));
        self.kind = self.kind.and(text("kind"));
        if let Some(CallbackRef::Named(_)) = self.callback {
            self.callback = text("callback").map(CallbackRef::Named);
        }
        if self.enabled.is_some() {
            self.enabled = substituted.get("enabled").cloned();
        }
        self
    }

    /// Parse one entry of a filtered hook list.
    ///
    /// Callbacks come back as names; non-object entries yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            id: text("id"),
            trigger: text("trigger"),
            callback: text("callback").map(CallbackRef::Named),
            kind: text("kind"),
            priority: map
                .get("priority")
                .and_then(Value::as_i64)
                .and_then(|p| i32::try_from(p).ok()),
            arity: map
                .get("arity")
                .and_then(Value::as_u64)
                .and_then(|a| usize::try_from(a).ok()),
            enabled: map.get("enabled").cloned(),
        })
    }
}

/// A validated hook declaration.
#[derive(Debug, Clone)]
pub struct HookSpec {
    pub id: String,
    pub trigger: String,
    pub callback: Callback,
    pub kind: HookKind,
    pub priority: i32,
    pub arity: usize,
}

impl HookSpec {
    /// JSON form used by the hook-list filter. The callback is written as a
    /// `"@<id>"` reference; a filter disables an entry by adding
    /// `"enabled": false`.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "trigger": self.trigger,
            "callback": self.direct_ref(),
            "kind": self.kind,
            "priority": self.priority,
            "arity": self.arity,
        })
    }

    pub fn direct_ref(&self) -> String {
        format!("{}{}", DIRECT_REF_PREFIX, self.id)
    }
}

/// Acknowledgement of one accepted registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisteredRef {
    pub trigger: String,
    pub id: String,
}

impl RegisteredRef {
    pub fn new(trigger: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            id: id.into(),
        }
    }
}
