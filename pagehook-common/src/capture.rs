//! Void-call adapter
//!
//! Some callables produce their output by writing it somewhere as a side
//! effect, others return it. [`capture_or_return`] treats both the same way:
//! the callable receives a buffer it may write into, and a non-empty return
//! value takes precedence over whatever was written.

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::matcher::args_match;

/// A callable that may write output into the buffer and/or return it.
pub type VoidCall = Arc<dyn Fn(&mut String, &[Value]) -> Option<String> + Send + Sync>;

/// Wrap a closure as a [`VoidCall`].
pub fn void_call<F>(f: F) -> VoidCall
where
    F: Fn(&mut String, &[Value]) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Invoke `call` with `args` when they satisfy `checks`, returning its output.
///
/// Returns `""` when the arguments do not match (null checks are skipped),
/// when there is no callable, or when `args` is empty.
///
/// # Example
///
/// ```rust
/// use pagehook_common::{capture_or_return, void_call};
/// use serde_json::json;
///
/// let printer = void_call(|out, args| {
///     out.push_str(&format!("<h1>{}</h1>", args[0].as_str().unwrap_or_default()));
///     None
/// });
///
/// let html = capture_or_return(&[json!("Options")], &[], Some(&printer));
/// assert_eq!(html, "<h1>Options</h1>");
///
/// let skipped = capture_or_return(&[json!("Options")], &[json!("Other")], Some(&printer));
/// assert_eq!(skipped, "");
/// ```
pub fn capture_or_return(args: &[Value], checks: &[Value], call: Option<&VoidCall>) -> String {
    let Some(call) = call else {
        return String::new();
    };
    if args.is_empty() || !args_match(args, checks, true) {
        trace!("capture_or_return: arguments did not qualify, skipping call");
        return String::new();
    }

    let mut captured = String::new();
    match call(&mut captured, args) {
        Some(returned) if !returned.is_empty() => returned,
        _ => captured,
    }
}
