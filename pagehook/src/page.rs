//! The page aggregate
//!
//! A [`Page`] coordinates the units sharing one admin surface and one
//! persisted-state identifier. It moves through
//!
//! ```text
//! Uninitialized -> Hooked -> MenuRegistered -> Rendered | Saved
//! ```
//!
//! `Rendered` and `Saved` end a request; [`Page::begin_request_cycle`] goes
//! back to `MenuRegistered` with an empty surface handle.
//!
//! `Page` is a cheap handle. Callbacks stored on the host keep clones of it,
//! so every method takes `&self` and no lock is held while the host runs.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use pagehook_common::{capture_or_return, PageHookError, Result};
use pagehook_config::EngineConfig;
use pagehook_hooks::{EventBus, Host, RegisteredRef};

use crate::menu::{self, MenuRegistration};
use crate::reconcile::reconcile_units;
use crate::render::{PageView, Renderer};
use crate::save::{self, SaveOutcome};
use crate::scheduler;
use crate::settings::SharedConfig;
use crate::unit::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Uninitialized,
    Hooked,
    MenuRegistered,
    Rendered,
    Saved,
}

impl PageState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PageState::Rendered | PageState::Saved)
    }
}

struct PageInner {
    page_id: String,
    persisted_state_id: String,
    registration_trigger: String,
    config: Arc<EngineConfig>,
    hooked: bool,
    surface_handle: String,
    units: IndexMap<String, Arc<dyn Unit>>,
    settings: Option<SharedConfig>,
    state: PageState,
    registered: Vec<RegisteredRef>,
    renderer: Option<Arc<dyn Renderer>>,
}

/// Shared handle to a page.
#[derive(Clone)]
pub struct Page {
    inner: Arc<RwLock<PageInner>>,
}

/// Builder for [`Page`].
pub struct PageBuilder {
    page_id: String,
    persisted_state_id: String,
    registration_trigger: Option<String>,
    config: Option<Arc<EngineConfig>>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl PageBuilder {
    /// Trigger the menu is registered on. Defaults to the configured
    /// registration trigger.
    pub fn registration_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.registration_trigger = Some(trigger.into());
        self
    }

    pub fn config(mut self, config: Arc<EngineConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Fails when either identifier is empty.
    pub fn build(self) -> Result<Page> {
        if self.page_id.trim().is_empty() {
            return Err(PageHookError::contract("Page::new", "page id must not be empty"));
        }
        if self.persisted_state_id.trim().is_empty() {
            return Err(PageHookError::contract(
                "Page::new",
                "persisted state id must not be empty",
            ));
        }

        let config = self.config.unwrap_or_default();
        let registration_trigger = self
            .registration_trigger
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| config.registration_trigger.clone());

        Ok(Page {
            inner: Arc::new(RwLock::new(PageInner {
                page_id: self.page_id,
                persisted_state_id: self.persisted_state_id,
                registration_trigger,
                config,
                hooked: false,
                surface_handle: String::new(),
                units: IndexMap::new(),
                settings: None,
                state: PageState::Uninitialized,
                registered: Vec::new(),
                renderer: self.renderer,
            })),
        })
    }
}

impl Page {
    pub fn builder(page_id: impl Into<String>, persisted_state_id: impl Into<String>) -> PageBuilder {
        PageBuilder {
            page_id: page_id.into(),
            persisted_state_id: persisted_state_id.into(),
            registration_trigger: None,
            config: None,
            renderer: None,
        }
    }

    /// Page with the default engine configuration.
    pub fn new(page_id: impl Into<String>, persisted_state_id: impl Into<String>) -> Result<Self> {
        Self::builder(page_id, persisted_state_id).build()
    }

    fn read(&self) -> RwLockReadGuard<'_, PageInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PageInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether two handles refer to the same page.
    pub fn ptr_eq(a: &Page, b: &Page) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn page_id(&self) -> String {
        self.read().page_id.clone()
    }

    pub fn persisted_state_id(&self) -> String {
        self.read().persisted_state_id.clone()
    }

    pub fn registration_trigger(&self) -> String {
        self.read().registration_trigger.clone()
    }

    pub fn config(&self) -> Arc<EngineConfig> {
        self.read().config.clone()
    }

    pub fn is_hooked(&self) -> bool {
        self.read().hooked
    }

    pub fn state(&self) -> PageState {
        self.read().state
    }

    /// Host-assigned surface identifier; empty until the menu is registered.
    pub fn surface_handle(&self) -> String {
        self.read().surface_handle.clone()
    }

    /// Snapshot of the cached settings.
    pub fn canonical_settings(&self) -> Option<SharedConfig> {
        self.read().settings.clone()
    }

    /// Attached units in attachment order.
    pub fn units(&self) -> Vec<Arc<dyn Unit>> {
        self.read().units.values().cloned().collect()
    }

    pub fn unit(&self, unit_id: &str) -> Option<Arc<dyn Unit>> {
        self.read().units.get(unit_id).cloned()
    }

    /// Every hook registration this page made, oldest first.
    pub fn registered_hooks(&self) -> Vec<RegisteredRef> {
        self.read().registered.clone()
    }

    pub(crate) fn renderer(&self) -> Option<Arc<dyn Renderer>> {
        self.read().renderer.clone()
    }

    pub fn set_renderer(&self, renderer: Arc<dyn Renderer>) {
        self.write().renderer = Some(renderer);
    }

    /// Attach `unit`, replacing a unit with the same id in place.
    pub fn attach_unit(&self, unit: Arc<dyn Unit>) {
        let mut inner = self.write();
        debug!("Attaching unit '{}' to page '{}'", unit.id(), inner.page_id);
        inner.units.insert(unit.id().to_string(), unit);
    }

    /// Drop the cached settings; the next reconciliation recomputes them.
    pub fn invalidate_settings(&self) {
        self.write().settings = None;
    }

    /// Start serving a new request: the surface handle is cleared and a
    /// finished page returns to `MenuRegistered`.
    pub fn begin_request_cycle(&self) {
        let mut inner = self.write();
        inner.surface_handle.clear();
        if inner.state.is_terminal() {
            inner.state = PageState::MenuRegistered;
        }
    }

    pub(crate) fn set_state(&self, state: PageState) {
        let mut inner = self.write();
        debug!("Page '{}' {:?} -> {:?}", inner.page_id, inner.state, state);
        inner.state = state;
    }

    /// Enter a terminal state unless the page was never initialized.
    fn finish(&self, state: PageState) {
        if self.state() != PageState::Uninitialized {
            self.set_state(state);
        }
    }

    pub(crate) fn record_registrations(&self, refs: &[RegisteredRef]) {
        self.write().registered.extend_from_slice(refs);
    }

    /// Reconcile shared settings from the attached units and cache them.
    ///
    /// Returns `None` when settings are already cached and no overrides are
    /// given, or when `overrides` is not an object.
    pub fn reconcile<B>(&self, bus: &B, overrides: Option<&Value>) -> Option<SharedConfig>
    where
        B: EventBus + ?Sized,
    {
        let overrides = match overrides {
            None if self.read().settings.is_some() => return None,
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                debug!("Ignoring non-object settings overrides: {}", other);
                return None;
            }
        };
        Some(self.compute_settings(bus, overrides))
    }

    /// Cached settings, reconciling first if there are none.
    pub fn ensure_settings<B>(&self, bus: &B) -> SharedConfig
    where
        B: EventBus + ?Sized,
    {
        match self.canonical_settings() {
            Some(settings) => settings,
            None => self.compute_settings(bus, None),
        }
    }

    fn compute_settings<B>(
        &self,
        bus: &B,
        overrides: Option<&serde_json::Map<String, Value>>,
    ) -> SharedConfig
    where
        B: EventBus + ?Sized,
    {
        let (page_id, units, config) = {
            let inner = self.read();
            let units: Vec<_> = inner.units.values().cloned().collect();
            (inner.page_id.clone(), units, inner.config.clone())
        };

        let settings = reconcile_units(&page_id, &units, &config.defaults, bus, overrides);
        self.write().settings = Some(settings.clone());
        settings
    }

    /// Hook the page into the host. Returns `false` if it already was.
    pub fn init(&self, host: &mut dyn Host) -> bool {
        {
            let mut inner = self.write();
            if inner.hooked {
                debug!("Page '{}' is already hooked", inner.page_id);
                return false;
            }
            inner.hooked = true;
        }

        self.ensure_settings(&*host);
        self.set_state(PageState::Hooked);

        let refs = scheduler::schedule(self, host);
        info!("Page '{}' hooked with {} early hooks", self.page_id(), refs.len());
        true
    }

    /// Register the page's menu surface and schedule the late hooks.
    ///
    /// Returns `None` before [`Page::init`], when the host assigned no
    /// handle, or when the surface was already registered in this request
    /// cycle.
    pub fn register_on_host_menu(&self, host: &mut dyn Host) -> Option<MenuRegistration> {
        if !self.is_hooked() {
            debug!("Page '{}' is not hooked yet, skipping menu registration", self.page_id());
            return None;
        }
        if !self.surface_handle().is_empty() {
            debug!("Page '{}' already has a surface this cycle", self.page_id());
            return None;
        }

        let settings = self.ensure_settings(&*host);
        let params = menu::compute_menu_params(self, &settings);
        let params = menu::filter_menu_params(self, params, &*host);

        let Some(handle) = menu::register_with_host(&params, host) else {
            warn!("Host assigned no surface to page '{}'", self.page_id());
            return None;
        };

        {
            let mut inner = self.write();
            inner.surface_handle = handle.clone();
            inner.state = PageState::MenuRegistered;
        }
        info!("Page '{}' registered as '{}'", self.page_id(), handle);

        scheduler::schedule(self, host);
        Some(MenuRegistration { handle, params })
    }

    /// Run the save/reset pipeline for the current request.
    pub fn save(&self, host: &mut dyn Host, redirect: bool) -> Option<SaveOutcome> {
        self.ensure_settings(&*host);
        let outcome = save::submit(self, host, redirect);
        self.finish(PageState::Saved);
        outcome
    }

    /// Render the page. A `display_cb` setting replaces the renderer.
    ///
    /// With `echo` the output is also written to the host.
    pub fn render(&self, host: &mut dyn Host, echo: bool) -> String {
        let settings = self.ensure_settings(&*host);
        let view = PageView::new(self, &settings);

        let output = match (&settings.display_cb, self.renderer()) {
            (Some(display), _) => {
                let args = [serde_json::to_value(&view).unwrap_or(Value::Null)];
                capture_or_return(&args, &[], Some(display))
            }
            (None, Some(renderer)) => renderer.render(&view),
            (None, None) => {
                warn!("Page '{}' has no renderer", view.page_id);
                String::new()
            }
        };

        if echo {
            host.emit(&output);
        }
        self.finish(PageState::Rendered);
        output
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("Page")
            .field("page_id", &inner.page_id)
            .field("persisted_state_id", &inner.persisted_state_id)
            .field("registration_trigger", &inner.registration_trigger)
            .field("state", &inner.state)
            .field("surface_handle", &inner.surface_handle)
            .field("units", &inner.units.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
