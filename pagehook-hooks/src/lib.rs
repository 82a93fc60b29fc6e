//! # pagehook Hooks
//!
//! The boundary between the page engine and the host platform, and the
//! machinery for declaring callbacks against the host's event bus.
//!
//! ## Modules
//!
//! - [`host`] - `EventBus`, `Platform` and `Host` traits plus `dispatch`
//! - [`callback`] - notification and transform callback types
//! - [`request`] - the current request and its submission
//! - [`surface`] - menu parameters, content boxes, assets, notices
//! - [`bus`] - in-memory `EventBus`
//! - [`spec`] - raw and normalized hook declarations
//! - [`normalize`] - defaults, validation and callback resolution
//! - [`registrar`] - registration and the `"pageHooks"` list filter
//!
//! ## Example
//!
//! ```rust
//! use pagehook_hooks::{Callback, EventBus, HookRegistrar, MemoryBus, RawHookSpec};
//! use serde_json::json;
//!
//! let resolver = |name: &str| match name {
//!     "shout" => Some(Callback::transform(|v, _| {
//!         json!(v.as_str().unwrap_or_default().to_uppercase())
//!     })),
//!     _ => None,
//! };
//!
//! let mut bus = MemoryBus::new();
//! let refs = HookRegistrar::new(&resolver).register(
//!     vec![RawHookSpec::new("title").trigger("pageTitle").named("shout").kind("transform")],
//!     "example",
//!     &mut bus,
//! );
//!
//! assert_eq!(refs.len(), 1);
//! assert_eq!(bus.apply_transform("pageTitle", json!("options"), &[]), json!("OPTIONS"));
//! ```

pub mod bus;
pub mod callback;
pub mod host;
pub mod normalize;
pub mod registrar;
pub mod request;
pub mod spec;
pub mod surface;

pub use bus::MemoryBus;
pub use callback::{Callback, NotificationFn, TransformFn};
pub use host::{dispatch, EventBus, Host, Platform};
pub use normalize::{normalize, CallbackResolver, NoResolver};
pub use registrar::{filter_specs, register, HookRegistrar, PAGE_HOOKS_FILTER};
pub use request::{Request, Submission, ACTION, RESET_CONTROL, SUBMIT_CONTROL};
pub use spec::{CallbackRef, HookKind, HookSpec, RawHookSpec, RegisteredRef};
pub use surface::{Asset, ContentBox, MenuParams, Notice, NoticeKind};
