//! # pagehook
//!
//! A shared administrative page engine. Several independently configured
//! units attach to one [`Page`]; the page reconciles their overlapping
//! settings into a [`SharedConfig`], registers its callbacks on the host's
//! event bus in two phases, and runs the save/reset pipeline for the
//! submissions it receives.
//!
//! ## Lifecycle
//!
//! 1. units attach through a [`PageRegistry`]
//! 2. [`Page::init`] reconciles settings and registers the early hooks
//! 3. the host fires the registration trigger; the page registers its menu
//!    surface and, keyed to the handle it got back, the late hooks
//! 4. the host either renders the page or submits to it
//!
//! ```rust
//! use std::sync::Arc;
//! use pagehook::{MemoryUnit, PageRegistry, PageState};
//! use pagehook_test_utils::TestHost;
//!
//! let mut registry = PageRegistry::new();
//! let unit = Arc::new(MemoryUnit::builder("general").title("Options").build());
//! let page = registry.attach(unit, "opts", "opt1", None).unwrap();
//!
//! let mut host = TestHost::new();
//! assert!(page.init(&mut host));
//! assert!(!page.init(&mut host));
//!
//! host.dispatch("adminMenu", &[]);
//! assert_eq!(page.surface_handle(), "toplevel_page_opts");
//! assert_eq!(page.state(), PageState::MenuRegistered);
//! ```

pub mod menu;
pub mod page;
pub mod reconcile;
pub mod registry;
pub mod render;
pub mod save;
pub mod scheduler;
pub mod settings;
pub mod unit;

pub use menu::{compute_menu_params, register_with_host, MenuRegistration};
pub use page::{Page, PageBuilder, PageState};
pub use reconcile::reconcile_units;
pub use registry::PageRegistry;
pub use render::{PageView, Renderer, UnitView};
pub use save::{can_save, fields_to_default, submit, SaveIntent, SaveOutcome, SaveStatus, UnitResult};
pub use scheduler::{select_hook_set, PageCallbacks};
pub use settings::{PageFormat, ResetMode, SharedConfig, PROPERTIES};
pub use unit::{FieldSpec, MemoryUnit, MemoryUnitBuilder, Unit};

pub use pagehook_common::{PageHookError, Result};
