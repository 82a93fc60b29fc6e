//! Request and submission model
//!
//! The host hands the engine the current request as plain data. The
//! submission is a flat, ordered key/value map of posted fields plus a few
//! control keys.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Submission key whose presence means "save".
pub const SUBMIT_CONTROL: &str = "submitControl";
/// Submission key whose presence means "reset".
pub const RESET_CONTROL: &str = "resetControl";
/// Submission key carrying the persisted-state identifier.
pub const ACTION: &str = "action";

/// Posted fields and control flags of the current request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Submission(IndexMap<String, Value>);

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String view of a value; `None` when absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace a value, keeping the original position of an
    /// existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder form of [`Submission::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, Value>> for Submission {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Submission {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The request being served.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    /// Posted fields and control flags
    pub submission: Submission,
    /// URL the submission came from
    pub referrer: String,
    /// Query-string parameters of the current URL
    pub query: IndexMap<String, String>,
    /// True during the host's internal autosave pass
    pub autosave: bool,
    /// True when the host has switched to another site for this request
    pub cross_site_switched: bool,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submission(mut self, submission: Submission) -> Self {
        self.submission = submission;
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = referrer.into();
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn with_cross_site_switched(mut self, switched: bool) -> Self {
        self.cross_site_switched = switched;
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}
