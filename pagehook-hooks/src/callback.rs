//! Callback types
//!
//! A callback registered on the host bus is either a notification (runs for
//! its side effects against the host) or a transform (receives a value and
//! returns the next one in the chain). Keeping the two apart in a tagged
//! union is what lets a hook spec be checked against its declared kind.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::host::Host;
use crate::spec::HookKind;

/// Side-effecting callback: receives the host and the trigger arguments.
pub type NotificationFn = Arc<dyn Fn(&mut dyn Host, &[Value]) + Send + Sync>;

/// Value-transform callback: receives the current value and the context
/// arguments and returns the next value.
pub type TransformFn = Arc<dyn Fn(Value, &[Value]) -> Value + Send + Sync>;

/// A resolved, invocable callback.
#[derive(Clone)]
pub enum Callback {
    Notification(NotificationFn),
    Transform(TransformFn),
}

impl Callback {
    /// Wrap a closure as a notification callback.
    pub fn notification<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Host, &[Value]) + Send + Sync + 'static,
    {
        Self::Notification(Arc::new(f))
    }

    /// Wrap a closure as a transform callback.
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self::Transform(Arc::new(f))
    }

    /// The hook kind this callback can be registered as.
    pub fn kind(&self) -> HookKind {
        match self {
            Self::Notification(_) => HookKind::Notification,
            Self::Transform(_) => HookKind::Transform,
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notification(_) => f.write_str("Callback::Notification(..)"),
            Self::Transform(_) => f.write_str("Callback::Transform(..)"),
        }
    }
}
