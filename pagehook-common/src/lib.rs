//! # pagehook Common
//!
//! Foundational value utilities and the error taxonomy shared by the pagehook
//! crates. Everything here is a leaf: no module depends on the page engine.
//!
//! ## Modules
//!
//! - [`merge`] - strict, kind-preserving recursive merge of settings objects
//! - [`matcher`] - positional argument matcher used to gate conditional calls
//! - [`tokens`] - recursive placeholder substitution
//! - [`capture`] - adapter for callables that print instead of returning
//! - [`value`] - runtime value kinds
//! - [`error`] - contract-violation errors and severity classification
//! - [`logging`] - helpers for log formatting

pub mod capture;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod merge;
pub mod tokens;
pub mod value;

pub use capture::{capture_or_return, void_call, VoidCall};
pub use error::{ErrorSeverity, PageHookError, Result, Severity};
pub use logging::Pretty;
pub use matcher::args_match;
pub use merge::merge_strict;
pub use tokens::{substitute_tokens, Tokens};
pub use value::{is_empty_value, ValueKind};
