//! Units: field groups that share a page
//!
//! A unit brings its own fields and persisted values and declares its view of
//! the page-level properties. The page only ever holds `Arc<dyn Unit>`
//! handles; the unit's owner keeps it alive.

use std::sync::{Mutex, PoisonError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use pagehook_common::{PageHookError, Result, VoidCall};
use pagehook_hooks::Submission;

use crate::settings::is_known_property;

/// Layout column a unit's box goes into on post-like pages.
pub const CONTEXT_NORMAL: &str = "normal";
pub const CONTEXT_SIDE: &str = "side";
pub const CONTEXT_ADVANCED: &str = "advanced";

/// A field the unit persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,
    /// Value the field takes on reset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A field group attached to a page.
pub trait Unit: Send + Sync {
    /// Identifier, unique within a page
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    /// The unit's declared value for a shared page property, if any.
    fn setting(&self, key: &str) -> Option<Value>;

    /// Custom page render callback.
    fn display_callback(&self) -> Option<VoidCall> {
        None
    }

    /// `normal`, `side` or `advanced`
    fn context(&self) -> &str {
        CONTEXT_NORMAL
    }

    fn fields(&self) -> Vec<FieldSpec>;

    fn save_enabled(&self) -> bool {
        true
    }

    /// Surface categories the unit may be saved from.
    fn surface_types(&self) -> Vec<String>;

    /// Persist the submitted values. Returns whether anything changed.
    fn save(&self, submission: &Submission) -> bool;
}

/// A [`Unit`] declared up front that keeps its values in memory.
///
/// Every submission passed to [`Unit::save`] is recorded so the values a
/// unit actually received can be inspected afterwards.
pub struct MemoryUnit {
    id: String,
    title: String,
    context: String,
    settings: IndexMap<String, Value>,
    display: Option<VoidCall>,
    fields: Vec<FieldSpec>,
    surface_types: Vec<String>,
    save_enabled: bool,
    stored: Mutex<IndexMap<String, Value>>,
    submissions: Mutex<Vec<Submission>>,
}

impl MemoryUnit {
    pub fn builder(id: impl Into<String>) -> MemoryUnitBuilder {
        MemoryUnitBuilder::new(id)
    }

    /// Currently stored value of `field`.
    pub fn stored_value(&self, field: &str) -> Option<Value> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .cloned()
    }

    /// Every submission this unit was asked to save, oldest first.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for MemoryUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUnit")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("context", &self.context)
            .field("settings", &self.settings)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl Unit for MemoryUnit {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn setting(&self, key: &str) -> Option<Value> {
        self.settings.get(key).cloned()
    }

    fn display_callback(&self) -> Option<VoidCall> {
        self.display.clone()
    }

    fn context(&self) -> &str {
        &self.context
    }

    fn fields(&self) -> Vec<FieldSpec> {
        self.fields.clone()
    }

    fn save_enabled(&self) -> bool {
        self.save_enabled
    }

    fn surface_types(&self) -> Vec<String> {
        self.surface_types.clone()
    }

    fn save(&self, submission: &Submission) -> bool {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(submission.clone());

        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;
        for field in &self.fields {
            let Some(value) = submission.get(&field.id) else {
                continue;
            };
            if stored.get(&field.id) != Some(value) {
                trace!("Unit '{}' field '{}' changed", self.id, field.id);
                stored.insert(field.id.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

/// Builder for [`MemoryUnit`].
pub struct MemoryUnitBuilder {
    unit: MemoryUnit,
}

impl std::fmt::Debug for MemoryUnitBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUnitBuilder")
            .field("id", &self.unit.id)
            .finish_non_exhaustive()
    }
}

impl MemoryUnitBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            unit: MemoryUnit {
                id: id.into(),
                title: String::new(),
                context: CONTEXT_NORMAL.to_string(),
                settings: IndexMap::new(),
                display: None,
                fields: Vec::new(),
                surface_types: vec!["options-page".to_string()],
                save_enabled: true,
                stored: Mutex::new(IndexMap::new()),
                submissions: Mutex::new(Vec::new()),
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.unit.title = title.into();
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.unit.context = context.into();
        self
    }

    /// Declare a shared page property.
    ///
    /// Fails with [`PageHookError::UnknownProperty`] for a key the property
    /// table does not know.
    pub fn setting(mut self, key: &str, value: impl Into<Value>) -> Result<Self> {
        if !is_known_property(key) {
            return Err(PageHookError::UnknownProperty(key.to_string()));
        }
        self.unit.settings.insert(key.to_string(), value.into());
        Ok(self)
    }

    pub fn display_callback(mut self, callback: VoidCall) -> Self {
        self.unit.display = Some(callback);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.unit.fields.push(field);
        self
    }

    /// Replace the declared surface types.
    pub fn surface_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unit.surface_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn save_enabled(mut self, enabled: bool) -> Self {
        self.unit.save_enabled = enabled;
        self
    }

    /// Seed a stored value, as if it had been saved before.
    pub fn stored(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.unit
            .stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field.into(), value.into());
        self
    }

    pub fn build(self) -> MemoryUnit {
        self.unit
    }
}
