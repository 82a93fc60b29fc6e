//! Page registry
//!
//! Keeps one [`Page`] per page id. Units sharing a page id find their page
//! here; the first unit to attach creates it and fixes its registration
//! trigger.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use pagehook_common::Result;
use pagehook_config::EngineConfig;

use crate::page::Page;
use crate::unit::Unit;

/// Registry of pages keyed by page id
///
/// The registry is an ordinary value owned by whoever serves the request;
/// tests build their own.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use pagehook::{MemoryUnit, PageRegistry};
///
/// let mut registry = PageRegistry::new();
/// let unit = Arc::new(MemoryUnit::builder("general").title("General").build());
/// let page = registry.attach(unit, "opts", "opt1", None).unwrap();
///
/// assert!(registry.get("opts").is_some());
/// assert_eq!(page.units().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: IndexMap<String, Page>,
    config: Arc<EngineConfig>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose new pages use `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            pages: IndexMap::new(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> Arc<EngineConfig> {
        self.config.clone()
    }

    /// Add `page`, replacing (and returning) a page with the same id.
    pub fn add(&mut self, page: Page) -> Option<Page> {
        let page_id = page.page_id();
        debug!("Registering page '{}'", page_id);
        self.pages.insert(page_id, page)
    }

    pub fn get(&self, page_id: &str) -> Option<Page> {
        self.pages.get(page_id).cloned()
    }

    /// All pages in insertion order.
    pub fn get_all(&self) -> Vec<Page> {
        self.pages.values().cloned().collect()
    }

    /// Pages storing their values under `persisted_state_id`.
    pub fn get_by_persisted_state_id(&self, persisted_state_id: &str) -> Vec<Page> {
        self.pages
            .values()
            .filter(|page| page.persisted_state_id() == persisted_state_id)
            .cloned()
            .collect()
    }

    /// Remove a page. Returns whether it was present.
    pub fn remove(&mut self, page_id: &str) -> bool {
        self.pages.shift_remove(page_id).is_some()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Attach `unit` to the page `page_id`, creating the page if needed.
    ///
    /// An existing page keeps its persisted-state id and registration
    /// trigger. Creating a page with an empty id fails.
    pub fn attach(
        &mut self,
        unit: Arc<dyn Unit>,
        page_id: &str,
        persisted_state_id: &str,
        registration_trigger: Option<&str>,
    ) -> Result<Page> {
        let page = match self.get(page_id) {
            Some(page) => page,
            None => {
                let mut builder =
                    Page::builder(page_id, persisted_state_id).config(self.config.clone());
                if let Some(trigger) = registration_trigger {
                    builder = builder.registration_trigger(trigger);
                }
                let page = builder.build()?;
                self.add(page.clone());
                page
            }
        };

        page.attach_unit(unit);
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::MemoryUnit;

    fn unit(id: &str) -> Arc<dyn Unit> {
        Arc::new(MemoryUnit::builder(id).build())
    }

    #[test]
    fn test_add_overwrites_same_id() {
        let mut registry = PageRegistry::new();
        let first = Page::new("opts", "opt1").unwrap();
        let second = Page::new("opts", "opt2").unwrap();

        assert!(registry.add(first.clone()).is_none());
        let replaced = registry.add(second.clone()).unwrap();

        assert!(Page::ptr_eq(&replaced, &first));
        let all = registry.get_all();
        assert_eq!(all.len(), 1);
        assert!(Page::ptr_eq(&all[0], &second));
    }

    #[test]
    fn test_lookup_and_removal() {
        let mut registry = PageRegistry::new();
        registry.add(Page::new("a", "shared").unwrap());
        registry.add(Page::new("b", "shared").unwrap());
        registry.add(Page::new("c", "other").unwrap());

        assert_eq!(registry.get_by_persisted_state_id("shared").len(), 2);
        assert!(registry.get_by_persisted_state_id("none").is_empty());
        assert!(registry.get("missing").is_none());

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        let ids: Vec<_> = registry.get_all().iter().map(Page::page_id).collect();
        assert_eq!(ids, vec!["b", "c"]);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_first_attach_fixes_trigger() {
        let mut registry = PageRegistry::new();
        let page = registry
            .attach(unit("u1"), "opts", "opt1", Some("networkMenu"))
            .unwrap();
        let same = registry
            .attach(unit("u2"), "opts", "ignored", Some("adminMenu"))
            .unwrap();

        assert!(Page::ptr_eq(&page, &same));
        assert_eq!(same.registration_trigger(), "networkMenu");
        assert_eq!(same.persisted_state_id(), "opt1");
        assert_eq!(same.units().len(), 2);
    }

    #[test]
    fn test_attach_uses_registry_config() {
        let config = EngineConfig {
            registration_trigger: "customMenu".to_string(),
            ..Default::default()
        };
        let mut registry = PageRegistry::with_config(config);
        let page = registry.attach(unit("u1"), "opts", "opt1", None).unwrap();
        assert_eq!(page.registration_trigger(), "customMenu");
    }

    #[test]
    fn test_attach_rejects_empty_id() {
        let mut registry = PageRegistry::new();
        assert!(registry.attach(unit("u1"), "", "opt1", None).is_err());
        assert!(registry.is_empty());
    }
}
