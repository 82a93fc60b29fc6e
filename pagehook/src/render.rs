//! Renderer seam
//!
//! Form markup is produced outside the engine. A [`Renderer`] receives a
//! [`PageView`]: everything about the page a form renderer needs, as plain
//! data.

use serde::Serialize;

use crate::page::Page;
use crate::settings::SharedConfig;
use crate::unit::FieldSpec;

/// External form renderer.
pub trait Renderer: Send + Sync {
    fn render(&self, view: &PageView) -> String;
}

impl<F> Renderer for F
where
    F: Fn(&PageView) -> String + Send + Sync,
{
    fn render(&self, view: &PageView) -> String {
        self(view)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitView {
    pub id: String,
    pub title: String,
    pub context: String,
    pub fields: Vec<FieldSpec>,
}

/// Snapshot of a page handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub page_id: String,
    pub persisted_state_id: String,
    pub surface_handle: String,
    pub settings: SharedConfig,
    pub units: Vec<UnitView>,
}

impl PageView {
    pub fn new(page: &Page, settings: &SharedConfig) -> Self {
        Self {
            page_id: page.page_id(),
            persisted_state_id: page.persisted_state_id(),
            surface_handle: page.surface_handle(),
            settings: settings.clone(),
            units: page
                .units()
                .iter()
                .map(|unit| UnitView {
                    id: unit.id().to_string(),
                    title: unit.title().to_string(),
                    context: unit.context().to_string(),
                    fields: unit.fields(),
                })
                .collect(),
        }
    }
}
